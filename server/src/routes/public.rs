use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::Instrument;

use folio_core::{
    deadpool_diesel, interact,
    model::{self, repository, repository::db::DbConn},
};

use crate::{
    app_state::SharedState,
    http_error::ApiResult,
    schema::{self, AboutPage, ProjectListPage, ProjectPage, SiteInfo},
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/home", get(get_home))
        .route("/tag/:tag", get(get_tag))
        .route("/about", get(get_about))
        .route("/projects/:id", get(get_project))
}

fn load_site_info(conn: &mut DbConn) -> eyre::Result<SiteInfo> {
    let config = repository::site_config::get_site_config(conn)?;
    let navigation = repository::tag::get_navigation(conn)?;
    Ok(SiteInfo::new(&config, navigation))
}

#[tracing::instrument(skip(app_state))]
pub async fn get_home(State(app_state): State<SharedState>) -> ApiResult<Json<ProjectListPage>> {
    let conn = app_state.pool.get().in_current_span().await?;
    let (site, projects) = interact!(conn, move |conn| {
        let site = load_site_info(conn)?;
        let projects = repository::project::get_projects(conn)?;
        Ok((site, projects))
    })
    .await??;
    Ok(Json(ProjectListPage {
        site,
        tag: None,
        projects: schema::Project::from_models(&projects, app_state.ingester.variants()),
    }))
}

#[tracing::instrument(skip(app_state))]
pub async fn get_tag(
    State(app_state): State<SharedState>,
    Path(tag): Path<String>,
) -> ApiResult<Json<ProjectListPage>> {
    let conn = app_state.pool.get().in_current_span().await?;
    let tag_name = tag.clone();
    let (site, projects) = interact!(conn, move |conn| {
        let site = load_site_info(conn)?;
        let projects = repository::project::get_projects_with_tag(conn, &tag_name)?;
        Ok((site, projects))
    })
    .await??;
    Ok(Json(ProjectListPage {
        site,
        tag: Some(tag),
        projects: schema::Project::from_models(&projects, app_state.ingester.variants()),
    }))
}

#[tracing::instrument(skip(app_state))]
pub async fn get_about(State(app_state): State<SharedState>) -> ApiResult<Json<AboutPage>> {
    let conn = app_state.pool.get().in_current_span().await?;
    let site = interact!(conn, load_site_info).await??;
    Ok(Json(AboutPage { site }))
}

#[tracing::instrument(skip(app_state))]
pub async fn get_project(
    State(app_state): State<SharedState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectPage>> {
    let project_id: model::ProjectId = schema::ProjectId(id).try_into()?;
    let conn = app_state.pool.get().in_current_span().await?;
    let (site, project) = interact!(conn, move |conn| {
        let project = repository::project::get_project(conn, project_id)?;
        let site = load_site_info(conn)?;
        Ok((site, project))
    })
    .await??;
    Ok(Json(ProjectPage {
        site,
        project: schema::Project::from_model(&project, app_state.ingester.variants()),
    }))
}
