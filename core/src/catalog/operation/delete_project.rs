use std::{collections::HashMap, time::SystemTime};

use diesel::Connection;
use eyre::Result;
use tracing::{info, instrument};

use crate::{
    catalog::{cleanup::CleanupPlan, storage_key},
    model::{
        repository::{self, db::DbConn},
        Digest, ImageFormat, ProjectId,
    },
    processing::image::VariantTable,
};

/// Deletes a project, its tag links and its image rows in one transaction.
///
/// Returns the storage keys that no image row references anymore. The files
/// are not touched here, pass the plan to `cleanup::apply_cleanup` once the
/// transaction has committed.
#[instrument(skip(conn, variants))]
pub fn delete_project(
    conn: &mut DbConn,
    project_id: ProjectId,
    variants: &VariantTable,
) -> Result<CleanupPlan> {
    let planned_at = SystemTime::now();
    let plan = conn.immediate_transaction(|conn| {
        let images = repository::image::get_images_for_project(conn, project_id)?;
        repository::tag::delete_project_tags(conn, project_id)?;
        repository::image::delete_images_for_project(conn, project_id)?;
        repository::project::delete_project(conn, project_id)?;

        let formats: HashMap<Digest, ImageFormat> = images
            .into_iter()
            .map(|image| (image.digest, image.format))
            .collect();
        let digests: Vec<Digest> = formats.keys().cloned().collect();
        let still_referenced = repository::image::get_referenced_digests(conn, &digests)?;

        let mut keys = Vec::new();
        let mut unreferenced: Vec<(&Digest, &ImageFormat)> = formats
            .iter()
            .filter(|(digest, _)| !still_referenced.contains(*digest))
            .collect();
        unreferenced.sort_by(|a, b| a.0.cmp(b.0));
        for (digest, format) in unreferenced {
            keys.push(storage_key::original(digest));
            for name in variants.names() {
                keys.push(storage_key::variant(name, digest, *format));
            }
        }
        Ok::<_, eyre::Report>(CleanupPlan::new(keys, planned_at))
    })?;
    info!(%project_id, unreferenced_keys = plan.keys.len(), "deleted project");
    Ok(plan)
}
