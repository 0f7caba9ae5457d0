//! fi-ap - 应付账款：采购订单与散装入库的供应商付款

pub mod application;
pub mod domain;
pub mod infrastructure;
