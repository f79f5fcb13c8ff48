pub mod color;
pub mod image;
pub mod token;
