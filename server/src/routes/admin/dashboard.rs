use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::Instrument;

use folio_core::{
    deadpool_diesel, interact,
    model::{
        repository::{self, analytics},
        AnalyticsSummary,
    },
};

use crate::{
    app_state::SharedState,
    http_error::{ApiResult, RequestError},
    schema::{self, Dashboard},
    session::AdminSession,
};

const RECENT_PROJECTS: i64 = 5;

#[tracing::instrument(skip_all)]
pub async fn get_dashboard(
    State(app_state): State<SharedState>,
    _admin: AdminSession,
) -> ApiResult<Json<Dashboard>> {
    let conn = app_state.pool.get().in_current_span().await?;
    let (recent, summary, categories) = interact!(conn, move |conn| {
        let recent = repository::project::get_recent_projects(conn, RECENT_PROJECTS)?;
        let summary =
            repository::analytics::get_summary(conn, analytics::DASHBOARD_SUMMARY_DAYS, Utc::now())?;
        let categories = repository::tag::get_category_counts(conn)?;
        Ok((recent, summary, categories))
    })
    .await??;
    Ok(Json(Dashboard {
        recent_projects: schema::Project::from_models(&recent, app_state.ingester.variants()),
        analytics: summary,
        categories,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<u32>,
}

#[tracing::instrument(skip(app_state, _admin))]
pub async fn get_analytics(
    State(app_state): State<SharedState>,
    _admin: AdminSession,
    Query(query): Query<AnalyticsQuery>,
) -> ApiResult<Json<AnalyticsSummary>> {
    let days = query.days.unwrap_or(analytics::DEFAULT_SUMMARY_DAYS);
    if days == 0 {
        return Err(RequestError::BadRequest("days must be at least 1".into()).into());
    }
    let conn = app_state.pool.get().in_current_span().await?;
    let summary = interact!(conn, move |conn| {
        repository::analytics::get_summary(conn, days, Utc::now())
    })
    .await??;
    Ok(Json(summary))
}
