use chrono::{DateTime, Duration, NaiveDate, Utc};
use claims::{assert_err, assert_ok};
use pretty_assertions::assert_eq;

use super::util::{insert_tagged_project, ymd};
use crate::{
    model::{
        repository::{self, analytics::RecordPageView, db::DbConn},
        DailyViews, PathCount, ProjectId, ProjectViews,
    },
    processing::hash::hash_ip,
};

fn view(
    conn: &mut DbConn,
    path: &str,
    referrer: &str,
    project_id: Option<ProjectId>,
    ip: &str,
    at: DateTime<Utc>,
) {
    assert_ok!(repository::analytics::insert_page_view(
        conn,
        &RecordPageView {
            page_path: path.to_owned(),
            referrer: referrer.to_owned(),
            project_id,
            ip_hash: hash_ip(ip),
            viewed_at: at,
        }
    ));
}

#[test]
fn summary_aggregates_window() {
    let mut conn = super::db::open_in_memory_and_migrate();
    let project = insert_tagged_project(&mut conn, "Reel", ymd(2024, 1, 1), &[]);
    let now = ymd(2024, 3, 10) + Duration::hours(12);
    let day1 = ymd(2024, 3, 8) + Duration::hours(9);
    let day2 = ymd(2024, 3, 9) + Duration::hours(18);

    view(&mut conn, "/", "https://search.example", None, "1.1.1.1", day1);
    view(&mut conn, "/", "", None, "1.1.1.1", day1);
    view(&mut conn, "/project/1", "https://search.example", Some(project), "2.2.2.2", day2);
    view(&mut conn, "/project/1", "https://social.example", Some(project), "3.3.3.3", day2);
    view(&mut conn, "/about", "", None, "2.2.2.2", day2);
    // outside a 7 day window
    view(&mut conn, "/old", "https://old.example", None, "9.9.9.9", now - Duration::days(20));

    let summary = assert_ok!(repository::analytics::get_summary(&mut conn, 7, now));
    assert_eq!(summary.days, 7);
    assert_eq!(summary.total_views, 5);
    assert_eq!(summary.unique_views, 3);
    assert_eq!(
        summary.top_pages,
        vec![
            PathCount {
                path: "/".into(),
                views: 2
            },
            PathCount {
                path: "/project/1".into(),
                views: 2
            },
            PathCount {
                path: "/about".into(),
                views: 1
            },
        ]
    );
    assert_eq!(
        summary.top_referrers,
        vec![
            PathCount {
                path: "https://search.example".into(),
                views: 2
            },
            PathCount {
                path: "https://social.example".into(),
                views: 1
            },
        ]
    );
    assert_eq!(
        summary.project_views,
        vec![ProjectViews {
            project_id: project,
            title: "Reel".into(),
            views: 2
        }]
    );
    assert_eq!(
        summary.daily_views,
        vec![
            DailyViews {
                day: NaiveDate::from_ymd_opt(2024, 3, 8).unwrap(),
                views: 2
            },
            DailyViews {
                day: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
                views: 3
            },
        ]
    );

    let month = assert_ok!(repository::analytics::get_summary(&mut conn, 30, now));
    assert_eq!(month.total_views, 6);
    assert_eq!(month.unique_views, 4);
}

#[test]
fn zero_days_is_rejected_and_empty_is_fine() {
    let mut conn = super::db::open_in_memory_and_migrate();
    let now = Utc::now();
    assert_err!(repository::analytics::get_summary(&mut conn, 0, now));
    let summary = assert_ok!(repository::analytics::get_summary(&mut conn, 1, now));
    assert_eq!(summary.total_views, 0);
    assert!(summary.top_pages.is_empty());
    assert!(summary.daily_views.is_empty());
}

#[test]
fn only_ip_hash_is_stored() {
    let mut conn = super::db::open_in_memory_and_migrate();
    let now = Utc::now();
    view(&mut conn, "/", "", None, "198.51.100.4", now);
    let views = assert_ok!(repository::analytics::get_page_views_since(
        &mut conn,
        now - Duration::minutes(1)
    ));
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].ip_hash, hash_ip("198.51.100.4"));
    assert!(!views[0].ip_hash.contains("198.51"));
}
