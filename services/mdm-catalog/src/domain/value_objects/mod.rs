mod hex_color;
mod product_image;

pub use hex_color::HexColor;
pub use product_image::ProductImage;
