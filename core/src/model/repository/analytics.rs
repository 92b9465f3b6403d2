use chrono::{DateTime, Duration, NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use eyre::{eyre, Context, Result};
use tracing::instrument;

use crate::model::{
    repository::db_entity::DbPageView, util::datetime_to_db_repr, AnalyticsSummary, DailyViews,
    PageView, PageViewId, PathCount, ProjectId, ProjectViews,
};

use super::db::DbConn;
use super::schema;

pub const DEFAULT_SUMMARY_DAYS: u32 = 30;
pub const DASHBOARD_SUMMARY_DAYS: u32 = 7;
const TOP_N: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPageView {
    pub page_path: String,
    pub referrer: String,
    pub project_id: Option<ProjectId>,
    /// see `processing::hash::hash_ip`
    pub ip_hash: String,
    pub viewed_at: DateTime<Utc>,
}

#[instrument(skip(conn), level = "trace")]
pub fn insert_page_view(conn: &mut DbConn, view: &RecordPageView) -> Result<PageViewId> {
    use schema::PageView;
    let id = diesel::insert_into(PageView::table)
        .values((
            PageView::page_path.eq(&view.page_path),
            PageView::referrer.eq(&view.referrer),
            PageView::project_id.eq(view.project_id.map(|id| id.0)),
            PageView::ip_hash.eq(&view.ip_hash),
            PageView::viewed_at.eq(datetime_to_db_repr(&view.viewed_at)),
        ))
        .returning(PageView::page_view_id)
        .get_result(conn)
        .wrap_err("error inserting into table PageView")?;
    Ok(PageViewId(id))
}

#[instrument(skip(conn), level = "trace")]
pub fn get_page_views_since(conn: &mut DbConn, since: DateTime<Utc>) -> Result<Vec<PageView>> {
    use schema::PageView;
    let db_views: Vec<DbPageView> = PageView::table
        .filter(PageView::viewed_at.ge(datetime_to_db_repr(&since)))
        .order(PageView::viewed_at)
        .select(DbPageView::as_select())
        .load(conn)
        .wrap_err("error querying table PageView")?;
    db_views.into_iter().map(|v| v.try_into()).collect()
}

/// Aggregates all page views of the last `days` days (counting back from `now`)
#[instrument(skip(conn), level = "trace")]
pub fn get_summary(conn: &mut DbConn, days: u32, now: DateTime<Utc>) -> Result<AnalyticsSummary> {
    if days == 0 {
        return Err(eyre!("analytics summary needs at least one day"));
    }
    let since = datetime_to_db_repr(&(now - Duration::days(days as i64)));

    #[derive(QueryableByName, Debug)]
    struct Totals {
        #[diesel(sql_type = BigInt)]
        pub total: i64,
        #[diesel(sql_type = BigInt)]
        pub uniq: i64,
    }

    #[derive(QueryableByName, Debug)]
    struct KeyCount {
        #[diesel(sql_type = Text)]
        pub key: String,
        #[diesel(sql_type = BigInt)]
        pub views: i64,
    }

    #[derive(QueryableByName, Debug)]
    struct ProjectCount {
        #[diesel(sql_type = BigInt)]
        pub project_id: i64,
        #[diesel(sql_type = Text)]
        pub title: String,
        #[diesel(sql_type = BigInt)]
        pub views: i64,
    }

    let totals: Totals = diesel::sql_query(
        r#"
SELECT COUNT(*) AS total, COUNT(DISTINCT ip_hash) AS uniq
FROM PageView WHERE viewed_at >= ?;
    "#,
    )
    .bind::<BigInt, _>(since)
    .get_result(conn)
    .wrap_err("error querying page view totals")?;

    let top_pages: Vec<KeyCount> = diesel::sql_query(
        r#"
SELECT page_path AS key, COUNT(*) AS views
FROM PageView WHERE viewed_at >= ?
GROUP BY page_path
ORDER BY views DESC, page_path ASC
LIMIT ?;
    "#,
    )
    .bind::<BigInt, _>(since)
    .bind::<BigInt, _>(TOP_N)
    .load(conn)
    .wrap_err("error querying top pages")?;

    let top_referrers: Vec<KeyCount> = diesel::sql_query(
        r#"
SELECT referrer AS key, COUNT(*) AS views
FROM PageView WHERE viewed_at >= ? AND referrer != ''
GROUP BY referrer
ORDER BY views DESC, referrer ASC
LIMIT ?;
    "#,
    )
    .bind::<BigInt, _>(since)
    .bind::<BigInt, _>(TOP_N)
    .load(conn)
    .wrap_err("error querying top referrers")?;

    let project_views: Vec<ProjectCount> = diesel::sql_query(
        r#"
SELECT PageView.project_id AS project_id, Project.title AS title, COUNT(*) AS views
FROM PageView INNER JOIN Project ON Project.project_id = PageView.project_id
WHERE PageView.viewed_at >= ?
GROUP BY PageView.project_id, Project.title
ORDER BY views DESC, Project.title ASC
LIMIT ?;
    "#,
    )
    .bind::<BigInt, _>(since)
    .bind::<BigInt, _>(TOP_N)
    .load(conn)
    .wrap_err("error querying project views")?;

    let daily: Vec<KeyCount> = diesel::sql_query(
        r#"
SELECT date(viewed_at / 1000, 'unixepoch') AS key, COUNT(*) AS views
FROM PageView WHERE viewed_at >= ?
GROUP BY key
ORDER BY key ASC;
    "#,
    )
    .bind::<BigInt, _>(since)
    .load(conn)
    .wrap_err("error querying daily views")?;

    let daily_views = daily
        .into_iter()
        .map(|row| {
            let day = NaiveDate::parse_from_str(&row.key, "%Y-%m-%d")
                .wrap_err_with(|| format!("invalid date from sqlite: {}", row.key))?;
            Ok(DailyViews {
                day,
                views: row.views,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let to_path_counts = |rows: Vec<KeyCount>| -> Vec<PathCount> {
        rows.into_iter()
            .map(|row| PathCount {
                path: row.key,
                views: row.views,
            })
            .collect()
    };

    Ok(AnalyticsSummary {
        days,
        total_views: totals.total,
        unique_views: totals.uniq,
        top_pages: to_path_counts(top_pages),
        top_referrers: to_path_counts(top_referrers),
        project_views: project_views
            .into_iter()
            .map(|row| ProjectViews {
                project_id: ProjectId(row.project_id),
                title: row.title,
                views: row.views,
            })
            .collect(),
        daily_views,
    })
}
