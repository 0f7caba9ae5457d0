mod plan;
mod repository;
mod subscription;
mod transaction;

pub use plan::*;
pub use repository::*;
pub use subscription::*;
pub use transaction::*;
