use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use eyre::{Context, Result};
use tracing::instrument;

use crate::model::{
    repository::db_entity::DbProject, sort_tags, util::datetime_to_db_repr, ImageRecord, Project,
    ProjectFields, ProjectId,
};

use super::db::DbConn;
use super::{image, schema, tag, NotFoundError};

#[instrument(skip(conn), level = "trace")]
pub fn insert_project(
    conn: &mut DbConn,
    fields: &ProjectFields,
    now: DateTime<Utc>,
) -> Result<ProjectId> {
    use schema::Project;
    let now = datetime_to_db_repr(&now);
    let id = diesel::insert_into(Project::table)
        .values((
            Project::title.eq(&fields.title),
            Project::description.eq(&fields.description),
            Project::video_embed.eq(&fields.video_embed),
            Project::date.eq(datetime_to_db_repr(&fields.date)),
            Project::created_at.eq(now),
            Project::updated_at.eq(now),
        ))
        .returning(Project::project_id)
        .get_result(conn)
        .wrap_err("error inserting into table Project")?;
    Ok(ProjectId(id))
}

#[instrument(skip(conn), level = "trace")]
pub fn update_project(
    conn: &mut DbConn,
    project_id: ProjectId,
    fields: &ProjectFields,
    now: DateTime<Utc>,
) -> Result<()> {
    use schema::Project;
    let rows_updated = diesel::update(Project::table.find(project_id.0))
        .set((
            Project::title.eq(&fields.title),
            Project::description.eq(&fields.description),
            Project::video_embed.eq(&fields.video_embed),
            Project::date.eq(datetime_to_db_repr(&fields.date)),
            Project::updated_at.eq(datetime_to_db_repr(&now)),
        ))
        .execute(conn)
        .wrap_err("error updating table Project")?;
    if rows_updated == 0 {
        return Err(NotFoundError::new("Project", project_id).into());
    }
    Ok(())
}

#[instrument(skip(conn), level = "trace")]
pub fn project_exists(conn: &mut DbConn, project_id: ProjectId) -> Result<bool> {
    use schema::Project;
    diesel::select(diesel::dsl::exists(Project::table.find(project_id.0)))
        .get_result(conn)
        .wrap_err("error querying table Project")
}

/// With tags and images
#[instrument(skip(conn), level = "trace")]
pub fn get_project(conn: &mut DbConn, project_id: ProjectId) -> Result<Project> {
    use schema::Project as ProjectTable;
    let db_project: Option<DbProject> = ProjectTable::table
        .find(project_id.0)
        .select(DbProject::as_select())
        .first(conn)
        .optional()
        .wrap_err("error querying table Project")?;
    let Some(db_project) = db_project else {
        return Err(NotFoundError::new("Project", project_id).into());
    };
    let mut project: Project = db_project.try_into()?;
    project.tags = tag::get_project_tags(conn, project_id)?;
    project.images = image::get_images_for_project(conn, project_id)?;
    Ok(project)
}

/// All projects, newest `date` first, with tags and images
#[instrument(skip(conn), level = "trace")]
pub fn get_projects(conn: &mut DbConn) -> Result<Vec<Project>> {
    use schema::Project;
    let db_projects: Vec<DbProject> = Project::table
        .order((Project::date.desc(), Project::project_id.desc()))
        .select(DbProject::as_select())
        .load(conn)
        .wrap_err("error querying table Project")?;
    with_tags_and_images(conn, db_projects)
}

/// Projects tagged with exactly `tag_name`, newest `date` first
#[instrument(skip(conn), level = "trace")]
pub fn get_projects_with_tag(conn: &mut DbConn, tag_name: &str) -> Result<Vec<Project>> {
    use schema::{Project, ProjectTag, Tag};
    let tagged = ProjectTag::table
        .inner_join(Tag::table)
        .filter(Tag::name.eq(tag_name))
        .select(ProjectTag::project_id);
    let db_projects: Vec<DbProject> = Project::table
        .filter(Project::project_id.eq_any(tagged))
        .order((Project::date.desc(), Project::project_id.desc()))
        .select(DbProject::as_select())
        .load(conn)
        .wrap_err("error querying table Project")?;
    with_tags_and_images(conn, db_projects)
}

/// Most recently created first
#[instrument(skip(conn), level = "trace")]
pub fn get_recent_projects(conn: &mut DbConn, limit: i64) -> Result<Vec<Project>> {
    use schema::Project;
    let db_projects: Vec<DbProject> = Project::table
        .order((Project::created_at.desc(), Project::project_id.desc()))
        .limit(limit)
        .select(DbProject::as_select())
        .load(conn)
        .wrap_err("error querying table Project")?;
    with_tags_and_images(conn, db_projects)
}

/// Deletes only the Project row, see `catalog::operation::delete_project`
/// for deleting a project with everything attached to it.
#[instrument(skip(conn), level = "trace")]
pub fn delete_project(conn: &mut DbConn, project_id: ProjectId) -> Result<()> {
    use schema::Project;
    let rows_deleted = diesel::delete(Project::table.find(project_id.0))
        .execute(conn)
        .wrap_err("error deleting from table Project")?;
    if rows_deleted == 0 {
        return Err(NotFoundError::new("Project", project_id).into());
    }
    Ok(())
}

fn with_tags_and_images(conn: &mut DbConn, db_projects: Vec<DbProject>) -> Result<Vec<Project>> {
    let mut projects = db_projects
        .into_iter()
        .map(|p| p.try_into())
        .collect::<Result<Vec<Project>>>()?;
    let ids: Vec<ProjectId> = projects.iter().map(|p| p.id).collect();

    let mut tags: HashMap<ProjectId, Vec<String>> = HashMap::new();
    for (project_id, name) in tag::get_tags_for_projects(conn, &ids)? {
        tags.entry(project_id).or_default().push(name);
    }
    let mut images: HashMap<ProjectId, Vec<ImageRecord>> = HashMap::new();
    for image in image::get_images_for_projects(conn, &ids)? {
        images.entry(image.project_id).or_default().push(image);
    }

    for project in projects.iter_mut() {
        if let Some(mut project_tags) = tags.remove(&project.id) {
            sort_tags(&mut project_tags);
            project.tags = project_tags;
        }
        project.images = images.remove(&project.id).unwrap_or_default();
    }
    Ok(projects)
}
