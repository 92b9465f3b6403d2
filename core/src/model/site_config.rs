use chrono::{DateTime, Utc};
use serde::Serialize;

use super::theme::DEFAULT_THEME;

/// The single row of site wide settings editable from the admin area
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteConfig {
    pub about_text: String,
    pub contact_info: String,
    /// injected verbatim into public pages
    pub tracking_code: String,
    pub theme_name: String,
    /// None if the row was never written
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            about_text: String::new(),
            contact_info: String::new(),
            tracking_code: String::new(),
            theme_name: DEFAULT_THEME.to_owned(),
            updated_at: None,
        }
    }
}
