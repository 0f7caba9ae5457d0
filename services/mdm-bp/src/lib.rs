//! mdm-bp - 供应商主数据

pub mod application;
pub mod domain;
pub mod infrastructure;
