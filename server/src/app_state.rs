use std::sync::Arc;

use folio_core::{
    catalog::operation::ingest_image::{Deadline, ImageIngester},
    config::Config,
    model::repository::db::DbPool,
};

pub struct AppState {
    pub pool: DbPool,
    pub ingester: ImageIngester,
    pub config: Config,
}

impl AppState {
    /// Deadline for the ingests of one request, starting now
    pub fn ingest_deadline(&self) -> Deadline {
        Deadline::after(self.config.ingest_timeout)
    }
}

pub type SharedState = Arc<AppState>;
