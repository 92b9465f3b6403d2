use diesel::{Queryable, Selectable};

use crate::model::{util::datetime_from_db_repr, PageView, PageViewId, ProjectId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = super::super::schema::PageView)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbPageView {
    pub page_view_id: i64,
    pub page_path: String,
    pub referrer: String,
    pub project_id: Option<i64>,
    pub ip_hash: String,
    pub viewed_at: i64,
}

impl TryFrom<DbPageView> for PageView {
    type Error = eyre::Report;

    fn try_from(value: DbPageView) -> Result<Self, Self::Error> {
        Ok(PageView {
            id: PageViewId(value.page_view_id),
            page_path: value.page_path,
            referrer: value.referrer,
            project_id: value.project_id.map(ProjectId),
            ip_hash: value.ip_hash,
            viewed_at: datetime_from_db_repr(value.viewed_at)?,
        })
    }
}
