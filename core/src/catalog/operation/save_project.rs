use chrono::{SubsecRound, Utc};
use diesel::Connection;
use tracing::{info, instrument};

use crate::model::{
    repository::{self, db::DbConn},
    ImageRecord, ProjectForm, ProjectId,
};

use super::ingest_image::{Deadline, ImageIngester, IngestError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedProject {
    pub project_id: ProjectId,
    /// only the images uploaded with this save
    pub new_images: Vec<ImageRecord>,
}

/// Creates a project with its tags and images in a single transaction.
/// Nothing is written to the database unless every image ingests.
#[instrument(skip(conn, ingester, form, uploads), fields(title = %form.title, uploads = uploads.len()))]
pub fn create_project<B: AsRef<[u8]>>(
    conn: &mut DbConn,
    ingester: &ImageIngester,
    form: &ProjectForm,
    uploads: &[B],
    deadline: Deadline,
) -> Result<SavedProject, IngestError> {
    let now = Utc::now().trunc_subsecs(3);
    let (fields, tags) = form.normalize(now)?;
    let saved = conn.immediate_transaction(|conn| {
        let project_id = repository::project::insert_project(conn, &fields, now)?;
        repository::tag::set_project_tags(conn, project_id, &tags)?;
        let new_images = ingester.ingest_batch(conn, project_id, uploads, deadline)?;
        Ok::<_, IngestError>(SavedProject {
            project_id,
            new_images,
        })
    })?;
    info!(project_id = %saved.project_id, images = saved.new_images.len(), "created project");
    Ok(saved)
}

/// Updates the fields and tags of an existing project and appends `uploads`
/// to its images, all or nothing.
#[instrument(skip(conn, ingester, form, uploads), fields(uploads = uploads.len()))]
pub fn update_project<B: AsRef<[u8]>>(
    conn: &mut DbConn,
    ingester: &ImageIngester,
    project_id: ProjectId,
    form: &ProjectForm,
    uploads: &[B],
    deadline: Deadline,
) -> Result<SavedProject, IngestError> {
    let now = Utc::now().trunc_subsecs(3);
    let (fields, tags) = form.normalize(now)?;
    let saved = conn.immediate_transaction(|conn| {
        repository::project::update_project(conn, project_id, &fields, now)?;
        repository::tag::set_project_tags(conn, project_id, &tags)?;
        let new_images = ingester.ingest_batch(conn, project_id, uploads, deadline)?;
        Ok::<_, IngestError>(SavedProject {
            project_id,
            new_images,
        })
    })?;
    info!(%project_id, images = saved.new_images.len(), "updated project");
    Ok(saved)
}
