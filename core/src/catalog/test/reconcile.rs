use std::time::{Duration, SystemTime};

use claims::assert_ok;
use pretty_assertions::assert_eq;

use super::{insert_test_project, stored_keys, test_ingester};
use crate::{
    catalog::{cleanup::reconcile, operation::ingest_image::Deadline, storage_key},
    model::{repository::db::open_in_memory_and_migrate, ImageFormat},
    processing::{hash::digest_bytes, image::test_image::jpeg_bytes},
};

const HOUR: Duration = Duration::from_secs(3600);

#[test]
fn sweeps_old_orphans_and_keeps_everything_else() {
    let mut conn = open_in_memory_and_migrate();
    let (_dir, ingester) = test_ingester();
    let store = ingester.store();
    let project_id = insert_test_project(&mut conn, "p");
    let kept = assert_ok!(ingester.ingest(&mut conn, project_id, &jpeg_bytes(100, 80), Deadline::never()));

    let orphan_bytes = b"orphaned original";
    let orphan = assert_ok!(store.save(orphan_bytes));
    assert_ok!(store.put(&storage_key::variant("thumbnail", &orphan, ImageFormat::Png), b"t"));
    assert_ok!(store.put("thumbnail/.tmpAbC123", b"half written"));
    assert_ok!(store.put("README", b"not ours"));

    // everything is recent: nothing goes
    let report = assert_ok!(reconcile(&mut conn, store, HOUR, SystemTime::now()));
    assert_eq!(report.removed, 0);
    assert_eq!(stored_keys(store).len(), 3 + 2 + 2);

    // an hour and a bit later the orphans and the temp file are old enough
    let later = SystemTime::now() + HOUR + Duration::from_secs(60);
    let report = assert_ok!(reconcile(&mut conn, store, HOUR, later));
    assert_eq!(report.removed, 3);
    assert_eq!(report.failed, 0);

    let mut expected = vec![
        "README".to_owned(),
        storage_key::original(&kept.digest),
        storage_key::variant("large", &kept.digest, ImageFormat::Jpeg),
        storage_key::variant("thumbnail", &kept.digest, ImageFormat::Jpeg),
    ];
    expected.sort();
    assert_eq!(stored_keys(store), expected);
    assert_eq!(orphan, digest_bytes(orphan_bytes));
}

#[test]
fn resaving_an_orphan_protects_it_from_the_sweep() {
    let mut conn = open_in_memory_and_migrate();
    let (_dir, ingester) = test_ingester();
    let store = ingester.store();
    let digest = assert_ok!(store.save(b"about to be reused"));

    // pretend the file has been lying around for a day
    let path = store.path_for(&storage_key::original(&digest)).unwrap();
    std::fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(SystemTime::now() - 24 * HOUR)
        .unwrap();

    // an ingest of the same bytes touches it again
    assert_ok!(store.save(b"about to be reused"));
    let report = assert_ok!(reconcile(&mut conn, store, HOUR, SystemTime::now()));
    assert_eq!(report.removed, 0);
    assert_ok!(store.get(&digest));
}
