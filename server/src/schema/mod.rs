mod id_types;
mod project;
mod site;

pub use id_types::*;
pub use project::*;
pub use site::*;
