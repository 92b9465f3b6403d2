use claims::assert_ok;
use pretty_assertions::assert_eq;

use super::util::{insert_tagged_project, ymd};
use crate::model::{repository, CategoryCount};

#[test]
fn set_project_tags_replaces_and_dedups() {
    let mut conn = super::db::open_in_memory_and_migrate();
    let id = insert_tagged_project(&mut conn, "p", ymd(2020, 1, 1), &["a", " a ", "", "Narrative"]);
    assert_eq!(
        assert_ok!(repository::tag::get_project_tags(&mut conn, id)),
        vec!["Narrative", "a"]
    );
    assert_ok!(repository::tag::set_project_tags(
        &mut conn,
        id,
        &["b".to_owned()]
    ));
    assert_eq!(
        assert_ok!(repository::tag::get_project_tags(&mut conn, id)),
        vec!["b"]
    );
    // tags are shared, not duplicated
    let first = assert_ok!(repository::tag::get_or_create_tag(&mut conn, "b"));
    let second = assert_ok!(repository::tag::get_or_create_tag(&mut conn, "b"));
    assert_eq!(first, second);
}

#[test]
fn navigation_lists_used_tags_in_tag_order() {
    let mut conn = super::db::open_in_memory_and_migrate();
    insert_tagged_project(&mut conn, "one", ymd(2020, 1, 1), &["travel", "Documentary"]);
    insert_tagged_project(&mut conn, "two", ymd(2020, 1, 1), &["Commercial", "aerial"]);
    insert_tagged_project(&mut conn, "three", ymd(2020, 1, 1), &["Commercial"]);
    // a tag nobody uses anymore
    assert_ok!(repository::tag::get_or_create_tag(&mut conn, "stale"));

    assert_eq!(
        assert_ok!(repository::tag::get_navigation(&mut conn)),
        vec!["Commercial", "Documentary", "aerial", "travel"]
    );
}

#[test]
fn category_counts_include_all_core_categories() {
    let mut conn = super::db::open_in_memory_and_migrate();
    insert_tagged_project(&mut conn, "one", ymd(2020, 1, 1), &["travel", "Documentary"]);
    insert_tagged_project(&mut conn, "two", ymd(2020, 1, 1), &["travel", "aerial"]);
    insert_tagged_project(&mut conn, "three", ymd(2020, 1, 1), &["Documentary", "travel"]);

    let count = |name: &str, count: i64| CategoryCount {
        name: name.to_owned(),
        count,
    };
    assert_eq!(
        assert_ok!(repository::tag::get_category_counts(&mut conn)),
        vec![
            count("Commercial", 0),
            count("Narrative", 0),
            count("Music Video", 0),
            count("Documentary", 2),
            count("travel", 3),
            count("aerial", 1),
        ]
    );
}
