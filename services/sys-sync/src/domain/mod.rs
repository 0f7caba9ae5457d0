//! 领域层
//!
//! 同步结果模型、表名校验、二进制列规则与表存储接口

pub mod binary;
pub mod identifier;
pub mod model;
pub mod store;

pub use binary::*;
pub use identifier::*;
pub use model::*;
pub use store::*;
