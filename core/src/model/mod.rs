pub mod repository;

mod digest;
mod id_types;
mod image;
mod page_view;
mod project;
pub mod sanitize;
mod session;
mod site_config;
mod tag;
pub mod theme;
mod user;
pub use digest::*;
pub use id_types::*;
pub use image::*;
pub use page_view::*;
pub use project::*;
pub use session::*;
pub use site_config::*;
pub use tag::*;
pub use user::*;

pub mod util;
