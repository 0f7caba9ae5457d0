//! softwear-common - 通用类型和工具库

pub mod money;
mod receipt;
pub mod retry;
pub mod text;
pub mod types;

pub use receipt::*;
pub use retry::*;
pub use text::*;
pub use types::*;
