//! fi-co - 费用、损益明细与现金流水稽核

pub mod application;
pub mod domain;
pub mod infrastructure;
