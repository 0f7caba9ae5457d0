pub mod auth;
pub mod commands;
pub mod handler;
pub mod history;

pub use auth::{AuthHandler, AuthSession};
pub use commands::*;
pub use handler::ServiceHandler;
pub use history::HistoryHandler;
