mod commands;
mod expense_handler;
mod report_handler;

pub use commands::*;
pub use expense_handler::{ExpenseHandler, ListExpensesQuery};
pub use report_handler::ReportHandler;
