mod billing;
pub mod persistence;

pub use billing::BillingAdminFeeGateway;
pub use persistence::{PostgresSaleRepository, PostgresVerificationRepository};
