use chrono::{DateTime, Utc};
use diesel::prelude::*;
use eyre::{Context, Result};
use tracing::instrument;

use crate::model::{
    repository::db_entity::DbSiteConfig, theme::find_theme, util::datetime_to_db_repr, SiteConfig,
};

use super::db::DbConn;
use super::schema;

const SITE_CONFIG_ROW: i64 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown theme '{0}'")]
pub struct UnknownThemeError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSiteConfig {
    pub about_text: String,
    pub contact_info: String,
    pub tracking_code: String,
    pub theme_name: String,
}

/// Defaults if the config was never saved
#[instrument(skip(conn), level = "trace")]
pub fn get_site_config(conn: &mut DbConn) -> Result<SiteConfig> {
    use schema::SiteConfig;
    let db_config: Option<DbSiteConfig> = SiteConfig::table
        .find(SITE_CONFIG_ROW)
        .select(DbSiteConfig::as_select())
        .first(conn)
        .optional()
        .wrap_err("error querying table SiteConfig")?;
    match db_config {
        Some(db_config) => db_config.try_into(),
        None => Ok(crate::model::SiteConfig::default()),
    }
}

#[instrument(skip(conn), level = "trace")]
pub fn update_site_config(
    conn: &mut DbConn,
    update: &UpdateSiteConfig,
    now: DateTime<Utc>,
) -> Result<SiteConfig> {
    use schema::SiteConfig;
    if find_theme(&update.theme_name).is_none() {
        return Err(UnknownThemeError(update.theme_name.clone()).into());
    }
    let now = datetime_to_db_repr(&now);
    let db_config: DbSiteConfig = diesel::insert_into(SiteConfig::table)
        .values((
            SiteConfig::site_config_id.eq(SITE_CONFIG_ROW),
            SiteConfig::about_text.eq(&update.about_text),
            SiteConfig::contact_info.eq(&update.contact_info),
            SiteConfig::tracking_code.eq(&update.tracking_code),
            SiteConfig::theme_name.eq(&update.theme_name),
            SiteConfig::updated_at.eq(now),
        ))
        .on_conflict(SiteConfig::site_config_id)
        .do_update()
        .set((
            SiteConfig::about_text.eq(&update.about_text),
            SiteConfig::contact_info.eq(&update.contact_info),
            SiteConfig::tracking_code.eq(&update.tracking_code),
            SiteConfig::theme_name.eq(&update.theme_name),
            SiteConfig::updated_at.eq(now),
        ))
        .returning(DbSiteConfig::as_returning())
        .get_result(conn)
        .wrap_err("error upserting into table SiteConfig")?;
    db_config.try_into()
}
