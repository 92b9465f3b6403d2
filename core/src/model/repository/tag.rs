use std::collections::HashSet;

use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use eyre::{Context, Result};
use tracing::instrument;

use crate::model::{
    compare_category_counts, sort_tags, CategoryCount, CoreCategory, ProjectId, TagId,
};

use super::db::DbConn;
use super::schema;

#[instrument(skip(conn), level = "trace")]
pub fn get_or_create_tag(conn: &mut DbConn, name: &str) -> Result<TagId> {
    use schema::Tag;
    let existing: Option<i64> = Tag::table
        .filter(Tag::name.eq(name))
        .select(Tag::tag_id)
        .first(conn)
        .optional()
        .wrap_err("error querying table Tag")?;
    if let Some(id) = existing {
        return Ok(TagId(id));
    }
    let id = diesel::insert_into(Tag::table)
        .values(Tag::name.eq(name))
        .returning(Tag::tag_id)
        .get_result(conn)
        .wrap_err("error inserting into table Tag")?;
    Ok(TagId(id))
}

/// Replaces the tags of a project. Names are trimmed, empty and duplicate
/// names are ignored and missing tags are created.
#[instrument(skip(conn), level = "trace")]
pub fn set_project_tags(conn: &mut DbConn, project_id: ProjectId, tags: &[String]) -> Result<()> {
    use schema::ProjectTag;
    diesel::delete(ProjectTag::table.filter(ProjectTag::project_id.eq(project_id.0)))
        .execute(conn)
        .wrap_err("error deleting from table ProjectTag")?;
    let mut seen: HashSet<&str> = HashSet::new();
    for name in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if !seen.insert(name) {
            continue;
        }
        let tag_id = get_or_create_tag(conn, name)?;
        diesel::insert_into(ProjectTag::table)
            .values((
                ProjectTag::project_id.eq(project_id.0),
                ProjectTag::tag_id.eq(tag_id.0),
            ))
            .execute(conn)
            .wrap_err("error inserting into table ProjectTag")?;
    }
    Ok(())
}

#[instrument(skip(conn), level = "trace")]
pub fn delete_project_tags(conn: &mut DbConn, project_id: ProjectId) -> Result<usize> {
    use schema::ProjectTag;
    diesel::delete(ProjectTag::table.filter(ProjectTag::project_id.eq(project_id.0)))
        .execute(conn)
        .wrap_err("error deleting from table ProjectTag")
}

/// In tag order
#[instrument(skip(conn), level = "trace")]
pub fn get_project_tags(conn: &mut DbConn, project_id: ProjectId) -> Result<Vec<String>> {
    use schema::{ProjectTag, Tag};
    let mut names: Vec<String> = ProjectTag::table
        .inner_join(Tag::table)
        .filter(ProjectTag::project_id.eq(project_id.0))
        .select(Tag::name)
        .load(conn)
        .wrap_err("error querying table ProjectTag")?;
    sort_tags(&mut names);
    Ok(names)
}

/// (project, tag name) pairs for all given projects, unordered
#[instrument(skip(conn, project_ids), level = "trace")]
pub fn get_tags_for_projects(
    conn: &mut DbConn,
    project_ids: &[ProjectId],
) -> Result<Vec<(ProjectId, String)>> {
    use schema::{ProjectTag, Tag};
    let ids: Vec<i64> = project_ids.iter().map(|id| id.0).collect();
    let rows: Vec<(i64, String)> = ProjectTag::table
        .inner_join(Tag::table)
        .filter(ProjectTag::project_id.eq_any(ids))
        .select((ProjectTag::project_id, Tag::name))
        .load(conn)
        .wrap_err("error querying table ProjectTag")?;
    Ok(rows
        .into_iter()
        .map(|(id, name)| (ProjectId(id), name))
        .collect())
}

/// Names of all tags that at least one project uses, in tag order
#[instrument(skip(conn), level = "trace")]
pub fn get_navigation(conn: &mut DbConn) -> Result<Vec<String>> {
    use schema::{ProjectTag, Tag};
    let mut names: Vec<String> = Tag::table
        .inner_join(ProjectTag::table)
        .select(Tag::name)
        .distinct()
        .load(conn)
        .wrap_err("error querying table Tag")?;
    sort_tags(&mut names);
    Ok(names)
}

/// Every tag with the number of projects using it. Core categories are
/// always included, even before any project uses them.
#[instrument(skip(conn), level = "trace")]
pub fn get_category_counts(conn: &mut DbConn) -> Result<Vec<CategoryCount>> {
    #[derive(QueryableByName, Debug)]
    struct Row {
        #[diesel(sql_type = Text)]
        pub name: String,
        #[diesel(sql_type = BigInt)]
        pub count: i64,
    }

    let rows: Vec<Row> = diesel::sql_query(
        r#"
SELECT Tag.name AS name, COUNT(ProjectTag.project_id) AS count
FROM Tag LEFT JOIN ProjectTag ON ProjectTag.tag_id = Tag.tag_id
GROUP BY Tag.tag_id, Tag.name;
    "#,
    )
    .load(conn)
    .wrap_err("error querying category counts")?;

    let mut counts: Vec<CategoryCount> = rows
        .into_iter()
        .map(|row| CategoryCount {
            name: row.name,
            count: row.count,
        })
        .collect();
    for core in CoreCategory::all_names() {
        if !counts.iter().any(|c| c.name == core) {
            counts.push(CategoryCount {
                name: core,
                count: 0,
            });
        }
    }
    counts.sort_by(compare_category_counts);
    Ok(counts)
}
