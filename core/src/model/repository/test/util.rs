use chrono::{DateTime, TimeZone, Utc};

use crate::model::{
    repository::{self, db::DbConn},
    ProjectFields, ProjectId,
};

pub fn fields(title: &str, date: DateTime<Utc>) -> ProjectFields {
    ProjectFields {
        title: title.to_owned(),
        description: format!("about {}", title),
        video_embed: String::new(),
        date,
    }
}

pub fn ymd(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Inserts a project dated `date` with `tags` and returns its id
pub fn insert_tagged_project(
    conn: &mut DbConn,
    title: &str,
    date: DateTime<Utc>,
    tags: &[&str],
) -> ProjectId {
    let id = repository::project::insert_project(conn, &fields(title, date), super::utc_now_millis_zero())
        .unwrap();
    let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
    repository::tag::set_project_tags(conn, id, &tags).unwrap();
    id
}
