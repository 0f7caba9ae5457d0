mod expense_repository;
mod report_repository;
mod rows;

pub use expense_repository::PostgresExpenseRepository;
pub use report_repository::PostgresReportRepository;
