//! sys-sync - 本地库与云端镜像库之间的逐表复制

pub mod application;
pub mod domain;
pub mod infrastructure;
