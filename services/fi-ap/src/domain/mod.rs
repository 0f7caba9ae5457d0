mod payable;
mod payment;
mod repository;

pub use payable::*;
pub use payment::*;
pub use repository::*;
