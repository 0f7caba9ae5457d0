mod report;
mod repository;
mod sales_return;

pub use report::*;
pub use repository::*;
pub use sales_return::*;
