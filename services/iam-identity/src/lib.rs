//! iam-identity - 登录、用户与角色管理、权限申请、地址与操作审计

pub mod application;
pub mod domain;
pub mod infrastructure;
