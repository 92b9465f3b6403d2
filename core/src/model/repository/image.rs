use std::collections::HashSet;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use eyre::{Context, Result};
use tracing::instrument;

use crate::model::{
    repository::db_entity::DbImage, util::datetime_to_db_repr, Digest, ImageFormat, ImageId,
    ImageRecord, ProjectId,
};

use super::db::DbConn;
use super::schema;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateImage {
    pub project_id: ProjectId,
    pub digest: Digest,
    pub format: ImageFormat,
    pub path: String,
    pub created_at: DateTime<Utc>,
}

#[instrument(skip(conn), level = "trace")]
pub fn insert_image(conn: &mut DbConn, image: &CreateImage) -> Result<ImageRecord> {
    use schema::Image;
    let id = diesel::insert_into(Image::table)
        .values((
            Image::project_id.eq(image.project_id.0),
            Image::digest.eq(image.digest.as_str()),
            Image::format_name.eq(image.format.as_ref()),
            Image::path.eq(&image.path),
            Image::created_at.eq(datetime_to_db_repr(&image.created_at)),
        ))
        .returning(Image::image_id)
        .get_result(conn)
        .wrap_err("error inserting into table Image")?;
    Ok(ImageRecord {
        id: ImageId(id),
        project_id: image.project_id,
        digest: image.digest.clone(),
        format: image.format,
        path: image.path.clone(),
        created_at: image.created_at,
    })
}

/// Newest first
#[instrument(skip(conn), level = "trace")]
pub fn get_images_for_project(
    conn: &mut DbConn,
    project_id: ProjectId,
) -> Result<Vec<ImageRecord>> {
    use schema::Image;
    let db_images: Vec<DbImage> = Image::table
        .filter(Image::project_id.eq(project_id.0))
        .order((Image::created_at.desc(), Image::image_id.desc()))
        .select(DbImage::as_select())
        .load(conn)
        .wrap_err("error querying table Image")?;
    db_images
        .into_iter()
        .map(|db_image| db_image.try_into())
        .collect::<Result<Vec<_>>>()
}

/// Newest first, grouped by project
#[instrument(skip(conn, project_ids), level = "trace")]
pub fn get_images_for_projects(
    conn: &mut DbConn,
    project_ids: &[ProjectId],
) -> Result<Vec<ImageRecord>> {
    use schema::Image;
    let ids: Vec<i64> = project_ids.iter().map(|id| id.0).collect();
    let db_images: Vec<DbImage> = Image::table
        .filter(Image::project_id.eq_any(ids))
        .order((
            Image::project_id,
            Image::created_at.desc(),
            Image::image_id.desc(),
        ))
        .select(DbImage::as_select())
        .load(conn)
        .wrap_err("error querying table Image")?;
    db_images
        .into_iter()
        .map(|db_image| db_image.try_into())
        .collect::<Result<Vec<_>>>()
}

#[instrument(skip(conn), level = "trace")]
pub fn delete_images_for_project(conn: &mut DbConn, project_id: ProjectId) -> Result<usize> {
    use schema::Image;
    diesel::delete(Image::table.filter(Image::project_id.eq(project_id.0)))
        .execute(conn)
        .wrap_err("error deleting from table Image")
}

/// The subset of `digests` still referenced by at least one Image row
#[instrument(skip(conn, digests), level = "trace")]
pub fn get_referenced_digests(
    conn: &mut DbConn,
    digests: &[Digest],
) -> Result<HashSet<Digest>> {
    use schema::Image;
    let strs: Vec<&str> = digests.iter().map(|d| d.as_str()).collect();
    let referenced: Vec<String> = Image::table
        .filter(Image::digest.eq_any(strs))
        .select(Image::digest)
        .distinct()
        .load(conn)
        .wrap_err("error querying table Image")?;
    referenced
        .into_iter()
        .map(|d| Digest::try_from(d).wrap_err("invalid digest in table Image"))
        .collect()
}

#[instrument(skip(conn), level = "trace")]
pub fn count_images_with_digest(conn: &mut DbConn, digest: &Digest) -> Result<i64> {
    use schema::Image;
    Image::table
        .filter(Image::digest.eq(digest.as_str()))
        .count()
        .get_result(conn)
        .wrap_err("error querying table Image")
}
