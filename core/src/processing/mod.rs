pub mod hash;
pub mod image;
