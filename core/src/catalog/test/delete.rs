use std::time::SystemTime;

use claims::{assert_err, assert_ok};
use pretty_assertions::assert_eq;

use super::{insert_test_project, stored_keys, test_ingester};
use crate::{
    catalog::{
        cleanup::{apply_cleanup, CleanupPlan, CleanupReport},
        operation::{delete_project::delete_project, ingest_image::Deadline},
        storage_key,
    },
    model::{
        repository::{self, db::open_in_memory_and_migrate, is_not_found},
        ImageFormat, ProjectId,
    },
    processing::image::test_image::jpeg_bytes,
};

#[test]
fn delete_returns_only_unreferenced_keys() {
    let mut conn = open_in_memory_and_migrate();
    let (_dir, ingester) = test_ingester();
    let doomed = insert_test_project(&mut conn, "doomed");
    let survivor = insert_test_project(&mut conn, "survivor");
    assert_ok!(repository::tag::set_project_tags(
        &mut conn,
        doomed,
        &["Commercial".to_owned()]
    ));

    let shared = jpeg_bytes(320, 240);
    let unique = jpeg_bytes(640, 480);
    assert_ok!(ingester.ingest(&mut conn, doomed, &shared, Deadline::never()));
    let unique_record = assert_ok!(ingester.ingest(&mut conn, doomed, &unique, Deadline::never()));
    let shared_record = assert_ok!(ingester.ingest(&mut conn, survivor, &shared, Deadline::never()));

    let plan = assert_ok!(delete_project(&mut conn, doomed, ingester.variants()));
    let digest = &unique_record.digest;
    assert_eq!(
        plan.keys,
        vec![
            storage_key::original(digest),
            storage_key::variant("thumbnail", digest, ImageFormat::Jpeg),
            storage_key::variant("large", digest, ImageFormat::Jpeg),
        ]
    );

    let err = assert_err!(repository::project::get_project(&mut conn, doomed));
    assert!(is_not_found(&err));
    assert_eq!(
        assert_ok!(repository::image::get_images_for_project(&mut conn, doomed)),
        vec![]
    );
    assert_eq!(
        assert_ok!(repository::tag::get_navigation(&mut conn)),
        Vec::<String>::new()
    );

    let report = assert_ok!(apply_cleanup(&mut conn, ingester.store(), &plan));
    assert_eq!(
        report,
        CleanupReport {
            removed: 3,
            ..Default::default()
        }
    );
    // the survivor's files are untouched
    assert_ok!(ingester.store().get(&shared_record.digest));
    assert_eq!(stored_keys(ingester.store()).len(), 3);
}

#[test]
fn deleting_missing_project_is_not_found() {
    let mut conn = open_in_memory_and_migrate();
    let (_dir, ingester) = test_ingester();
    let err = assert_err!(delete_project(&mut conn, ProjectId(7), ingester.variants()));
    assert!(is_not_found(&err));
}

#[test]
fn cleanup_counts_missing_files() {
    let mut conn = open_in_memory_and_migrate();
    let (_dir, ingester) = test_ingester();
    assert_ok!(ingester.store().put("thumbnail/present.jpg", b"x"));
    let plan = CleanupPlan::new(
        vec!["thumbnail/present.jpg".into(), "thumbnail/gone.jpg".into()],
        SystemTime::now(),
    );
    let report = assert_ok!(apply_cleanup(&mut conn, ingester.store(), &plan));
    assert_eq!(
        report,
        CleanupReport {
            removed: 1,
            missing: 1,
            ..Default::default()
        }
    );
    // running it again is harmless
    let again = assert_ok!(apply_cleanup(&mut conn, ingester.store(), &plan));
    assert_eq!(again.missing, 2);
}

#[test]
fn cleanup_keeps_files_reused_by_a_later_ingest() {
    let mut conn = open_in_memory_and_migrate();
    let (_dir, ingester) = test_ingester();
    let first = insert_test_project(&mut conn, "first");
    let bytes = jpeg_bytes(320, 240);
    assert_ok!(ingester.ingest(&mut conn, first, &bytes, Deadline::never()));

    let plan = assert_ok!(delete_project(&mut conn, first, ingester.variants()));
    assert_eq!(plan.keys.len(), 3);

    // same bytes uploaded to another project before the files are removed
    let second = insert_test_project(&mut conn, "second");
    let record = assert_ok!(ingester.ingest(&mut conn, second, &bytes, Deadline::never()));

    let report = assert_ok!(apply_cleanup(&mut conn, ingester.store(), &plan));
    assert_eq!(
        report,
        CleanupReport {
            kept: 3,
            ..Default::default()
        }
    );
    assert_eq!(assert_ok!(ingester.store().get(&record.digest)), bytes);
    for name in ingester.variants().names() {
        let key = storage_key::variant(name, &record.digest, ImageFormat::Jpeg);
        assert_ok!(ingester.store().read_key(&key));
    }
}

#[test]
fn cleanup_keeps_files_touched_after_the_plan() {
    let mut conn = open_in_memory_and_migrate();
    let (_dir, ingester) = test_ingester();
    let project = insert_test_project(&mut conn, "project");
    assert_ok!(ingester.ingest(&mut conn, project, &jpeg_bytes(64, 48), Deadline::never()));
    let plan = assert_ok!(delete_project(&mut conn, project, ingester.variants()));

    // an ingest that wrote the files but has not committed its row yet
    for key in &plan.keys {
        assert!(assert_ok!(ingester.store().refresh(key)));
    }

    let report = assert_ok!(apply_cleanup(&mut conn, ingester.store(), &plan));
    assert_eq!(report.kept, 3);
    assert_eq!(report.removed, 0);
    assert_eq!(stored_keys(ingester.store()).len(), 3);
}

#[test]
fn failed_file_removal_does_not_restore_rows() {
    let mut conn = open_in_memory_and_migrate();
    let (_dir, ingester) = test_ingester();
    let project = insert_test_project(&mut conn, "project");
    let record = assert_ok!(ingester.ingest(
        &mut conn,
        project,
        &jpeg_bytes(64, 48),
        Deadline::never()
    ));

    // a directory where the thumbnail should be makes remove_file fail
    let thumbnail = storage_key::variant("thumbnail", &record.digest, ImageFormat::Jpeg);
    let path = assert_ok!(ingester.store().path_for(&thumbnail));
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("blocker"), b"x").unwrap();

    let plan = assert_ok!(delete_project(&mut conn, project, ingester.variants()));
    let report = assert_ok!(apply_cleanup(&mut conn, ingester.store(), &plan));
    assert_eq!(
        report,
        CleanupReport {
            removed: 2,
            failed: 1,
            ..Default::default()
        }
    );

    let err = assert_err!(repository::project::get_project(&mut conn, project));
    assert!(is_not_found(&err));
    assert_eq!(
        assert_ok!(repository::image::get_images_for_project(&mut conn, project)),
        vec![]
    );
    assert_eq!(
        assert_ok!(repository::image::count_images_with_digest(
            &mut conn,
            &record.digest
        )),
        0
    );
}
