//! sd-rr - 退货：退货申请、审批回库与管理费冲销、退货报表

pub mod application;
pub mod domain;
pub mod infrastructure;
