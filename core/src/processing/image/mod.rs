mod variants;
pub use variants::*;

#[cfg(test)]
pub mod test_image;
