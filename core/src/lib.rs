pub mod auth;
pub mod catalog;
pub mod config;
pub mod core;
pub mod model;
pub mod processing;
pub use deadpool_diesel;
