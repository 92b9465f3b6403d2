use camino::Utf8PathBuf as PathBuf;
use chrono::Utc;

use crate::{
    core::storage::ContentStore,
    model::{
        repository::{self, db::DbConn},
        ProjectFields, ProjectId,
    },
    processing::image::VariantTable,
};

use super::operation::ingest_image::ImageIngester;

mod delete;
mod reconcile;

pub fn test_ingester() -> (tempfile::TempDir, ImageIngester) {
    let dir = tempfile::tempdir().unwrap();
    let root = PathBuf::from_path_buf(dir.path().join("uploads")).unwrap();
    let store = ContentStore::open(root).unwrap();
    (dir, ImageIngester::new(store, VariantTable::default()))
}

pub fn insert_test_project(conn: &mut DbConn, title: &str) -> ProjectId {
    let fields = ProjectFields {
        title: title.to_owned(),
        description: String::new(),
        video_embed: String::new(),
        date: Utc::now(),
    };
    repository::project::insert_project(conn, &fields, Utc::now()).unwrap()
}

/// Keys of all files below the store root, sorted
pub fn stored_keys(store: &ContentStore) -> Vec<String> {
    let mut keys: Vec<String> = store
        .list_files()
        .unwrap()
        .into_iter()
        .map(|f| f.key)
        .collect();
    keys.sort();
    keys
}
