use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{PageViewId, ProjectId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub id: PageViewId,
    pub page_path: String,
    /// empty if the request had no Referer
    pub referrer: String,
    pub project_id: Option<ProjectId>,
    /// hex SHA-256 of the client address, the address itself is never stored
    pub ip_hash: String,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCount {
    pub path: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectViews {
    pub project_id: ProjectId,
    pub title: String,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyViews {
    pub day: NaiveDate,
    pub views: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub days: u32,
    pub total_views: i64,
    pub unique_views: i64,
    pub top_pages: Vec<PathCount>,
    pub top_referrers: Vec<PathCount>,
    pub project_views: Vec<ProjectViews>,
    /// ascending by day, days without views are absent
    pub daily_views: Vec<DailyViews>,
}
