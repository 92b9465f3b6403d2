pub mod delete_project;
pub mod ingest_image;
pub mod save_project;
