mod attribute;
mod product;
mod variant;

pub use attribute::*;
pub use product::*;
pub use variant::*;
