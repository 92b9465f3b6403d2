use diesel::{Queryable, Selectable};
use eyre::Context;

use crate::model::{
    util::datetime_from_db_repr, Digest, ImageFormat, ImageId, ImageRecord, ProjectId,
};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = super::super::schema::Image)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbImage {
    pub image_id: i64,
    pub project_id: i64,
    pub digest: String,
    pub format_name: String,
    pub path: String,
    pub created_at: i64,
}

impl TryFrom<DbImage> for ImageRecord {
    type Error = eyre::Report;

    fn try_from(value: DbImage) -> Result<Self, Self::Error> {
        let digest = Digest::try_from(value.digest).wrap_err("invalid digest in table Image")?;
        let format = value
            .format_name
            .parse::<ImageFormat>()
            .wrap_err("invalid format_name in table Image")?;
        Ok(ImageRecord {
            id: ImageId(value.image_id),
            project_id: ProjectId(value.project_id),
            digest,
            format,
            path: value.path,
            created_at: datetime_from_db_repr(value.created_at)?,
        })
    }
}
