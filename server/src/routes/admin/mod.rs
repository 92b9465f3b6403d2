use axum::{routing::get, Router};

use crate::app_state::SharedState;

pub mod dashboard;
pub mod projects;
pub mod settings;

/// Every handler here extracts an `AdminSession`, so requests without a
/// valid session cookie get a 401.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/analytics", get(dashboard::get_analytics))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/projects/:id",
            get(projects::get_project)
                .post(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
}
