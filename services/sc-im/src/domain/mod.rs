mod inventory;
mod movement;
mod repository;

pub use inventory::*;
pub use movement::*;
pub use repository::*;
