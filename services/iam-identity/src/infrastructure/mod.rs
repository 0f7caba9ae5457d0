pub mod billing;
pub mod persistence;

pub use billing::BillingSubscriptionGateway;
pub use persistence::{
    PostgresAddressRepository, PostgresHistoryRepository, PostgresUserRepository,
};
