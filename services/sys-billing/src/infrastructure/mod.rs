pub mod persistence;

pub use persistence::{PostgresSubscriptionRepository, record_admin_fee_reversal};
