use axum::{extract::DefaultBodyLimit, middleware, Router};

use crate::{app_state::SharedState, page_views};

pub mod admin;
pub mod auth;
pub mod public;
pub mod uploads;

/// All routes of the site, with page view recording and the upload size limit
pub fn router(state: SharedState) -> Router {
    let max_upload_size = state.config.max_upload_size;
    let api = Router::new()
        .merge(public::router())
        .merge(auth::router())
        .nest("/admin", admin::router());
    Router::new()
        .nest("/api", api)
        .merge(uploads::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            page_views::record_page_view,
        ))
        .layer(DefaultBodyLimit::max(max_upload_size))
        .with_state(state)
}
