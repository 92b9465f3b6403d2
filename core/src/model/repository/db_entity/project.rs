use diesel::{Queryable, Selectable};

use crate::model::{util::datetime_from_db_repr, Project, ProjectId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = super::super::schema::Project)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbProject {
    pub project_id: i64,
    pub title: String,
    pub description: String,
    pub video_embed: String,
    pub date: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// tags and images are loaded separately and left empty here
impl TryFrom<DbProject> for Project {
    type Error = eyre::Report;

    fn try_from(value: DbProject) -> Result<Self, Self::Error> {
        Ok(Project {
            id: ProjectId(value.project_id),
            title: value.title,
            description: value.description,
            video_embed: value.video_embed,
            date: datetime_from_db_repr(value.date)?,
            created_at: datetime_from_db_repr(value.created_at)?,
            updated_at: datetime_from_db_repr(value.updated_at)?,
            tags: Vec::new(),
            images: Vec::new(),
        })
    }
}
