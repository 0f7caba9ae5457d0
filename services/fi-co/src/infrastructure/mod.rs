pub mod persistence;

pub use persistence::{PostgresExpenseRepository, PostgresReportRepository};
