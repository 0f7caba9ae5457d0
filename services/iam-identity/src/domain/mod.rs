//! 身份领域模型

pub mod address;
pub mod email;
pub mod history;
pub mod password;
pub mod permission;
pub mod repository;
pub mod role;
pub mod user;

pub use address::*;
pub use email::*;
pub use history::*;
pub use password::*;
pub use permission::*;
pub use repository::*;
pub use role::*;
pub use user::*;
