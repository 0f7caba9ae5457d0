//! softwear-adapter-postgres - PostgreSQL 适配器

mod connection;
mod error;
mod migration;
mod numbering;
mod query;
mod transaction;

pub use connection::*;
pub use error::*;
pub use migration::*;
pub use numbering::*;
pub use query::*;
pub use transaction::*;
