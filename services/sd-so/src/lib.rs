//! sd-so - 销售：收银开单、销售报表与看板、每日销售核对

pub mod application;
pub mod domain;
pub mod infrastructure;
