use camino::{Utf8Path as Path, Utf8PathBuf as PathBuf};
use std::{
    io::{ErrorKind, Write},
    time::SystemTime,
};
use tracing::{debug, instrument};

use crate::{
    catalog::storage_key,
    model::{Digest, InvalidDigestError},
    processing::hash::digest_bytes,
};

/// Local content addressed blob store.
///
/// Originals are addressed by the SHA-256 of their bytes and live at
/// `objects/<ab>/<cd>/<digest>`. Derived files are written under arbitrary
/// relative keys (see `catalog::storage_key`). Every write goes to a temp
/// file in the destination directory first and is renamed into place, so
/// readers never observe partially written objects.
///
/// There is no way to delete by digest: files are only removed by key,
/// by the cleanup code that knows they are unreferenced.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("no stored object with key '{0}'")]
    NotFound(String),
    #[error("storage io error for key '{key}'")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    InvalidDigest(#[from] InvalidDigestError),
    #[error("invalid storage key '{0}'")]
    InvalidKey(String),
}

impl StoreError {
    fn io(key: &str, source: std::io::Error) -> StoreError {
        if source.kind() == ErrorKind::NotFound {
            StoreError::NotFound(key.to_owned())
        } else {
            StoreError::Io {
                key: key.to_owned(),
                source,
            }
        }
    }
}

/// A file found in the store by `ContentStore::list_files`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub key: String,
    pub modified: SystemTime,
}

impl ContentStore {
    pub fn new(root: PathBuf) -> ContentStore {
        ContentStore { root }
    }

    /// Creates the root directory if needed
    pub fn open(root: PathBuf) -> Result<ContentStore, StoreError> {
        std::fs::create_dir_all(&root).map_err(|err| StoreError::io("", err))?;
        Ok(ContentStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stores `bytes` under their digest. Saving the same bytes again is a
    /// cheap no-op that only refreshes the file's modification time.
    #[instrument(skip(self, bytes), fields(len = bytes.len()), level = "debug")]
    pub fn save(&self, bytes: &[u8]) -> Result<Digest, StoreError> {
        let digest = digest_bytes(bytes);
        self.save_as(&digest, bytes)?;
        Ok(digest)
    }

    /// `save` for callers that already hashed `bytes`
    pub(crate) fn save_as(&self, digest: &Digest, bytes: &[u8]) -> Result<(), StoreError> {
        debug_assert_eq!(digest, &digest_bytes(bytes));
        self.write_if_absent(&storage_key::original(digest), bytes)
    }

    #[instrument(skip(self), level = "debug")]
    pub fn get(&self, digest: &Digest) -> Result<Vec<u8>, StoreError> {
        self.read_key(&storage_key::original(digest))
    }

    pub fn exists(&self, digest: &Digest) -> Result<bool, StoreError> {
        self.key_exists(&storage_key::original(digest))
    }

    /// Writes a derived file under `key`. Same contract as `save`: if the key
    /// already exists the content is assumed identical and kept.
    #[instrument(skip(self, bytes), fields(len = bytes.len()), level = "debug")]
    pub fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.write_if_absent(key, bytes)
    }

    pub fn read_key(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key)?;
        std::fs::read(&path).map_err(|err| StoreError::io(key, err))
    }

    pub fn key_exists(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        path.as_std_path().try_exists().map_err(|err| StoreError::io(key, err))
    }

    /// If `key` exists, bumps its modification time and returns true
    pub fn refresh(&self, key: &str) -> Result<bool, StoreError> {
        let path = self.path_for(key)?;
        match touch(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::io(key, err)),
        }
    }

    /// Local path a key maps to, whether or not it exists.
    /// Keys are `/` separated relative paths, every segment non-empty and
    /// neither `.` nor `..`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.contains('\\')
            && key
                .split('/')
                .all(|s| !s.is_empty() && s != "." && s != "..");
        if !valid {
            return Err(StoreError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(key))
    }

    /// Removes the file at `key`. Only for cleaning up unreferenced files.
    #[instrument(skip(self), level = "debug")]
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        std::fs::remove_file(&path).map_err(|err| StoreError::io(key, err))
    }

    /// Modification time of the file at `key`
    pub fn modified(&self, key: &str) -> Result<SystemTime, StoreError> {
        let path = self.path_for(key)?;
        std::fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .map_err(|err| StoreError::io(key, err))
    }

    /// Every regular file below the root, including leftover temp files
    pub fn list_files(&self) -> Result<Vec<StoredFile>, StoreError> {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(&self.root).min_depth(1) {
            let entry = entry.map_err(|err| {
                let key = err
                    .path()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_default();
                StoreError::Io {
                    key,
                    source: err.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(rel) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let Some(key) = rel.to_str() else {
                debug!(path = %entry.path().display(), "skipping non utf8 path in store");
                continue;
            };
            let modified = entry
                .metadata()
                .map_err(|err| StoreError::Io {
                    key: key.to_owned(),
                    source: err.into(),
                })?
                .modified()
                .map_err(|err| StoreError::io(key, err))?;
            files.push(StoredFile {
                key: key.to_owned(),
                modified,
            });
        }
        Ok(files)
    }

    fn write_if_absent(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        // a concurrent sweep must see an existing file as fresh
        if self.refresh(key)? {
            return Ok(());
        }
        let path = self.path_for(key)?;
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::InvalidKey(key.to_owned()))?;
        std::fs::create_dir_all(dir).map_err(|err| StoreError::io(key, err))?;
        let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|err| StoreError::io(key, err))?;
        temp.write_all(bytes)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|err| StoreError::io(key, err))?;
        temp.persist(&path)
            .map_err(|err| StoreError::io(key, err.error))?;
        Ok(())
    }
}

fn touch(path: &Path) -> std::io::Result<()> {
    std::fs::File::options()
        .write(true)
        .open(path)?
        .set_modified(SystemTime::now())
}
