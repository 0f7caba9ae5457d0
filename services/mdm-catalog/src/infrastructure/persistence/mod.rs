//! PostgreSQL 持久化

mod converters;
mod postgres;
mod rows;

pub use postgres::*;
