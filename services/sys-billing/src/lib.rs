//! sys-billing - 订阅套餐与平台管理费

pub mod application;
pub mod domain;
pub mod infrastructure;
