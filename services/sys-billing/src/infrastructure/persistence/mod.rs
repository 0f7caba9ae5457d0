//! PostgreSQL 持久化

mod postgres;
mod rows;

pub use postgres::{PostgresSubscriptionRepository, record_admin_fee_reversal};
