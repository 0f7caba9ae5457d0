//! 基础设施层

pub mod observability;
pub mod persistence;

#[cfg(test)]
pub mod memory;

pub use persistence::PostgresTableStore;
