mod repository;
mod supplier;

pub use repository::*;
pub use supplier::*;
