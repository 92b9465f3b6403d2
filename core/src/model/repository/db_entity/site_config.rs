use diesel::{Queryable, Selectable};

use crate::model::{util::datetime_from_db_repr, SiteConfig};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = super::super::schema::SiteConfig)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbSiteConfig {
    pub site_config_id: i64,
    pub about_text: String,
    pub contact_info: String,
    pub tracking_code: String,
    pub theme_name: String,
    pub updated_at: i64,
}

impl TryFrom<DbSiteConfig> for SiteConfig {
    type Error = eyre::Report;

    fn try_from(value: DbSiteConfig) -> Result<Self, Self::Error> {
        Ok(SiteConfig {
            about_text: value.about_text,
            contact_info: value.contact_info,
            tracking_code: value.tracking_code,
            theme_name: value.theme_name,
            updated_at: Some(datetime_from_db_repr(value.updated_at)?),
        })
    }
}
