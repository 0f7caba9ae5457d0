mod report;
mod repository;
mod sale;
mod verification;

pub use report::*;
pub use repository::*;
pub use sale::*;
pub use verification::*;
