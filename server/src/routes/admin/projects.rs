use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info, warn, Instrument};

use folio_core::{
    catalog::{
        cleanup,
        operation::{delete_project as delete_op, save_project},
    },
    deadpool_diesel, interact,
    model::{self, repository, ProjectForm},
};

use crate::{
    app_state::SharedState,
    http_error::{ApiResult, HttpError},
    schema::{self, Project},
    session::AdminSession,
};

/// A project form as submitted by the admin UI, with the raw image uploads
#[derive(Debug, Default)]
pub struct ProjectUpload {
    pub form: ProjectForm,
    pub images: Vec<Bytes>,
}

pub async fn read_project_upload(mut multipart: Multipart) -> Result<ProjectUpload, HttpError> {
    let mut upload = ProjectUpload::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "images" | "images[]" => {
                let bytes = field.bytes().await?;
                // browsers send an empty part for an untouched file input
                if !bytes.is_empty() {
                    upload.images.push(bytes);
                }
            }
            "title" => upload.form.title = field.text().await?,
            "description" => upload.form.description = field.text().await?,
            "video_embed" => upload.form.video_embed = field.text().await?,
            "date" => upload.form.date = field.text().await?,
            "categories" | "categories[]" => upload.form.categories.push(field.text().await?),
            "custom_tags" => upload.form.custom_tags = field.text().await?,
            other => debug!(field = other, "ignoring unknown form field"),
        }
    }
    Ok(upload)
}

fn parse_id(id: String) -> ApiResult<model::ProjectId> {
    Ok(schema::ProjectId(id).try_into()?)
}

#[tracing::instrument(skip_all)]
pub async fn list_projects(
    State(app_state): State<SharedState>,
    _admin: AdminSession,
) -> ApiResult<Json<Vec<Project>>> {
    let conn = app_state.pool.get().in_current_span().await?;
    let projects = interact!(conn, repository::project::get_projects).await??;
    Ok(Json(Project::from_models(
        &projects,
        app_state.ingester.variants(),
    )))
}

#[tracing::instrument(skip(app_state, _admin))]
pub async fn get_project(
    State(app_state): State<SharedState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    let project_id = parse_id(id)?;
    let conn = app_state.pool.get().in_current_span().await?;
    let project = interact!(conn, move |conn| {
        repository::project::get_project(conn, project_id)
    })
    .await??;
    Ok(Json(Project::from_model(
        &project,
        app_state.ingester.variants(),
    )))
}

/// Creates a project from a multipart form. All uploaded images are
/// ingested in the same transaction, one bad image fails the whole request.
#[tracing::instrument(skip_all)]
pub async fn create_project(
    State(app_state): State<SharedState>,
    _admin: AdminSession,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let ProjectUpload { form, images } = read_project_upload(multipart).await?;
    let deadline = app_state.ingest_deadline();
    let state = app_state.clone();
    let conn = app_state.pool.get().in_current_span().await?;
    let project = interact!(conn, move |conn| {
        let saved = match save_project::create_project(
            conn,
            &state.ingester,
            &form,
            &images,
            deadline,
        ) {
            Ok(saved) => saved,
            Err(err) => return Ok(Err(err)),
        };
        let project = repository::project::get_project(conn, saved.project_id)?;
        Ok(Ok(project))
    })
    .await???;
    Ok((
        StatusCode::CREATED,
        Json(Project::from_model(
            &project,
            app_state.ingester.variants(),
        )),
    ))
}

/// Replaces the fields and tags of a project and adds the uploaded images
#[tracing::instrument(skip(app_state, _admin, multipart))]
pub async fn update_project(
    State(app_state): State<SharedState>,
    _admin: AdminSession,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<Project>> {
    let project_id = parse_id(id)?;
    let ProjectUpload { form, images } = read_project_upload(multipart).await?;
    let deadline = app_state.ingest_deadline();
    let state = app_state.clone();
    let conn = app_state.pool.get().in_current_span().await?;
    let project = interact!(conn, move |conn| {
        if let Err(err) = save_project::update_project(
            conn,
            &state.ingester,
            project_id,
            &form,
            &images,
            deadline,
        ) {
            return Ok(Err(err));
        }
        let project = repository::project::get_project(conn, project_id)?;
        Ok(Ok(project))
    })
    .await???;
    Ok(Json(Project::from_model(
        &project,
        app_state.ingester.variants(),
    )))
}

/// Deletes the project and afterwards removes the files no other image uses
#[tracing::instrument(skip(app_state, _admin))]
pub async fn delete_project(
    State(app_state): State<SharedState>,
    _admin: AdminSession,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let project_id = parse_id(id)?;
    let variants = app_state.ingester.variants().clone();
    let conn = app_state.pool.get().in_current_span().await?;
    let plan = interact!(conn, move |conn| {
        delete_op::delete_project(conn, project_id, &variants)
    })
    .await??;
    let store = app_state.ingester.store().clone();
    // the project is gone either way, leftovers are swept by the reconciler
    match interact!(conn, move |conn| cleanup::apply_cleanup(conn, &store, &plan)).await {
        Ok(Ok(report)) => info!(
            %project_id,
            removed = report.removed,
            missing = report.missing,
            kept = report.kept,
            failed = report.failed,
            "cleaned up files of deleted project"
        ),
        Ok(Err(err)) | Err(err) => {
            warn!(%project_id, error = %err, "file cleanup after delete failed")
        }
    }
    Ok(StatusCode::NO_CONTENT)
}
