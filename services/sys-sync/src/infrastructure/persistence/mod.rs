//! 持久化实现

mod postgres;
mod rows;

pub use postgres::PostgresTableStore;
