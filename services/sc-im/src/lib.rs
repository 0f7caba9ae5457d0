//! sc-im - 库存管理：库存水平、入库、出库、库存调整

pub mod application;
pub mod domain;
pub mod infrastructure;
