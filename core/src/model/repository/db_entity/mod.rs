mod image;
mod page_view;
mod project;
mod session;
mod site_config;
mod user;

pub use image::*;
pub use page_view::*;
pub use project::*;
pub use session::*;
pub use site_config::*;
pub use user::*;
