//! softwear-bootstrap - 统一启动骨架
//!
//! CLI 与后台任务复用的运行时初始化和基础设施创建逻辑

mod infrastructure;
mod runtime;

pub use infrastructure::*;
pub use runtime::*;
