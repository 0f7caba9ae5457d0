mod cashflow;
mod expense;
mod income;
mod repository;

pub use cashflow::*;
pub use expense::*;
pub use income::*;
pub use repository::*;
