use axum::{extract::State, Json};
use chrono::{SubsecRound, Utc};
use tracing::{info, Instrument};

use folio_core::{
    deadpool_diesel, interact,
    model::repository::{self, site_config::UpdateSiteConfig},
};

use crate::{
    app_state::SharedState,
    http_error::ApiResult,
    schema::{Settings, UpdateSettingsRequest},
    session::AdminSession,
};

#[tracing::instrument(skip_all)]
pub async fn get_settings(
    State(app_state): State<SharedState>,
    _admin: AdminSession,
) -> ApiResult<Json<Settings>> {
    let conn = app_state.pool.get().in_current_span().await?;
    let config = interact!(conn, repository::site_config::get_site_config).await??;
    Ok(Json(config.into()))
}

#[tracing::instrument(skip_all, fields(theme = %request.theme_name))]
pub async fn update_settings(
    State(app_state): State<SharedState>,
    _admin: AdminSession,
    Json(request): Json<UpdateSettingsRequest>,
) -> ApiResult<Json<Settings>> {
    let update: UpdateSiteConfig = request.into();
    let conn = app_state.pool.get().in_current_span().await?;
    let config = interact!(conn, move |conn| {
        repository::site_config::update_site_config(conn, &update, Utc::now().trunc_subsecs(3))
    })
    .await??;
    info!("updated site settings");
    Ok(Json(config.into()))
}
