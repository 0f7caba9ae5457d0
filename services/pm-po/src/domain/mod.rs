mod purchase_order;
mod repository;

pub use purchase_order::*;
pub use repository::*;
