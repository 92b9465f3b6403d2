use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use folio_core::model::{
    self, repository::site_config::UpdateSiteConfig, theme, AnalyticsSummary, CategoryCount,
};

use super::Project;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeInfo {
    pub name: &'static str,
    pub stylesheet: &'static str,
}

/// What every public page needs besides its own content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteInfo {
    pub theme: ThemeInfo,
    pub about_text: String,
    pub contact_info: String,
    pub tracking_code: String,
    pub navigation: Vec<String>,
}

impl SiteInfo {
    pub fn new(config: &model::SiteConfig, navigation: Vec<String>) -> SiteInfo {
        let theme = theme::get_theme(&config.theme_name);
        SiteInfo {
            theme: ThemeInfo {
                name: theme.name,
                stylesheet: theme.stylesheet,
            },
            about_text: config.about_text.clone(),
            contact_info: config.contact_info.clone(),
            tracking_code: config.tracking_code.clone(),
            navigation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectListPage {
    pub site: SiteInfo,
    /// set when the list is filtered by a tag
    pub tag: Option<String>,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectPage {
    pub site: SiteInfo,
    pub project: Project,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AboutPage {
    pub site: SiteInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub about_text: String,
    pub contact_info: String,
    pub tracking_code: String,
    pub theme_name: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub themes: Vec<&'static str>,
}

impl From<model::SiteConfig> for Settings {
    fn from(config: model::SiteConfig) -> Self {
        Settings {
            about_text: config.about_text,
            contact_info: config.contact_info,
            tracking_code: config.tracking_code,
            theme_name: config.theme_name,
            updated_at: config.updated_at,
            themes: theme::THEMES.iter().map(|t| t.name).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpdateSettingsRequest {
    #[serde(default)]
    pub about_text: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub tracking_code: String,
    pub theme_name: String,
}

impl From<UpdateSettingsRequest> for UpdateSiteConfig {
    fn from(request: UpdateSettingsRequest) -> Self {
        UpdateSiteConfig {
            about_text: request.about_text,
            contact_info: request.contact_info,
            tracking_code: request.tracking_code,
            theme_name: request.theme_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub recent_projects: Vec<Project>,
    pub analytics: AnalyticsSummary,
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub expires_at: DateTime<Utc>,
}
