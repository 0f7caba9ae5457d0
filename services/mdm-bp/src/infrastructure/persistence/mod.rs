//! PostgreSQL 持久化

mod postgres;
mod rows;

pub use postgres::PostgresSupplierRepository;
