//! PostgreSQL 持久化

mod address_repository;
mod history_repository;
mod rows;
mod user_repository;

pub use address_repository::PostgresAddressRepository;
pub use history_repository::PostgresHistoryRepository;
pub use user_repository::PostgresUserRepository;
