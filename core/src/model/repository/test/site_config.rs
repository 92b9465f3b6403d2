use claims::{assert_err, assert_ok};
use pretty_assertions::assert_eq;

use super::utc_now_millis_zero;
use crate::model::{
    repository::{
        self,
        site_config::{UnknownThemeError, UpdateSiteConfig},
    },
    SiteConfig,
};

fn update(theme: &str) -> UpdateSiteConfig {
    UpdateSiteConfig {
        about_text: "We make films.".into(),
        contact_info: "hello@example.com".into(),
        tracking_code: "<script></script>".into(),
        theme_name: theme.into(),
    }
}

#[test]
fn defaults_until_first_save() {
    let mut conn = super::db::open_in_memory_and_migrate();
    let config = assert_ok!(repository::site_config::get_site_config(&mut conn));
    assert_eq!(config, SiteConfig::default());
    assert_eq!(config.theme_name, "default");
}

#[test]
fn update_upserts_single_row() {
    let mut conn = super::db::open_in_memory_and_migrate();
    let now = utc_now_millis_zero();
    let saved = assert_ok!(repository::site_config::update_site_config(
        &mut conn,
        &update("minimal"),
        now
    ));
    assert_eq!(saved.theme_name, "minimal");
    assert_eq!(saved.updated_at, Some(now));

    let later = now + chrono::Duration::seconds(10);
    assert_ok!(repository::site_config::update_site_config(
        &mut conn,
        &update("default"),
        later
    ));
    let config = assert_ok!(repository::site_config::get_site_config(&mut conn));
    assert_eq!(
        config,
        SiteConfig {
            about_text: "We make films.".into(),
            contact_info: "hello@example.com".into(),
            tracking_code: "<script></script>".into(),
            theme_name: "default".into(),
            updated_at: Some(later),
        }
    );
}

#[test]
fn unknown_theme_is_rejected() {
    let mut conn = super::db::open_in_memory_and_migrate();
    let err = assert_err!(repository::site_config::update_site_config(
        &mut conn,
        &update("neon"),
        utc_now_millis_zero()
    ));
    assert_eq!(
        err.downcast_ref::<UnknownThemeError>(),
        Some(&UnknownThemeError("neon".into()))
    );
    assert_eq!(
        assert_ok!(repository::site_config::get_site_config(&mut conn)),
        SiteConfig::default()
    );
}
