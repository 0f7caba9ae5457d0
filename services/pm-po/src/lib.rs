//! pm-po - 采购订单：下单、审批、收货入库、取消

pub mod application;
pub mod domain;
pub mod infrastructure;
