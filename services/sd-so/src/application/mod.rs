pub mod commands;
pub mod handler;
pub mod verification;

pub use commands::*;
pub use handler::ServiceHandler;
pub use verification::VerificationHandler;
