use std::{
    collections::{HashMap, HashSet},
    time::{Duration, SystemTime},
};

use eyre::Result;
use itertools::Itertools;
use tracing::{debug, info, instrument, warn};

use crate::{
    catalog::storage_key,
    core::storage::{ContentStore, StoreError},
    model::{
        repository::{self, db::DbConn},
        Digest,
    },
};

/// Storage keys that became unreferenced by a committed deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupPlan {
    pub keys: Vec<String>,
    /// taken before the deleting transaction started
    pub planned_at: SystemTime,
}

impl CleanupPlan {
    pub fn new(keys: Vec<String>, planned_at: SystemTime) -> CleanupPlan {
        CleanupPlan { keys, planned_at }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: usize,
    /// already gone, e.g. a variant that was never generated
    pub missing: usize,
    /// referenced again or written to after the plan was made
    pub kept: usize,
    pub failed: usize,
}

/// Removes the files in `plan`, logging and counting failures.
///
/// Ingests commit under the same write lock as the delete, so a digest that
/// was reused after the plan was made either has an Image row again or had
/// its files touched after `planned_at`. Both are kept. Never retries and
/// never writes to the database: anything left behind is picked up by the
/// next `reconcile`.
#[instrument(skip(conn, store, plan), fields(keys = plan.keys.len()))]
pub fn apply_cleanup(
    conn: &mut DbConn,
    store: &ContentStore,
    plan: &CleanupPlan,
) -> Result<CleanupReport> {
    let digests: Vec<Digest> = plan
        .keys
        .iter()
        .filter_map(|key| storage_key::digest_from_key(key))
        .unique()
        .collect();
    let mut referenced = HashSet::new();
    for chunk in digests.chunks(DIGEST_QUERY_CHUNK) {
        referenced.extend(repository::image::get_referenced_digests(conn, chunk)?);
    }

    let mut report = CleanupReport::default();
    for key in &plan.keys {
        let reused = storage_key::digest_from_key(key).is_some_and(|d| referenced.contains(&d));
        if reused {
            debug!(%key, "digest referenced again, keeping file");
            report.kept += 1;
            continue;
        }
        match store.modified(key) {
            Ok(modified) if modified >= plan.planned_at => {
                debug!(%key, "file touched after the delete, keeping it");
                report.kept += 1;
                continue;
            }
            Ok(_) => {}
            Err(StoreError::NotFound(_)) => {
                report.missing += 1;
                continue;
            }
            Err(err) => {
                warn!(%key, error = %err, "could not stat unreferenced file");
                report.failed += 1;
                continue;
            }
        }
        match store.remove(key) {
            Ok(()) => report.removed += 1,
            Err(StoreError::NotFound(_)) => report.missing += 1,
            Err(err) => {
                warn!(%key, error = %err, "could not remove unreferenced file");
                report.failed += 1;
            }
        }
    }
    debug!(?report, "cleanup done");
    Ok(report)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub scanned: usize,
    pub removed: usize,
    /// unreferenced but younger than the grace period
    pub kept_recent: usize,
    pub failed: usize,
}

// stay well below sqlite's bound parameter limit
const DIGEST_QUERY_CHUNK: usize = 500;

/// Sweeps files whose digest no Image row references.
///
/// Files modified less than `grace` before `now` are kept, since they may
/// belong to an ingest whose transaction has not committed yet. Stale temp
/// files from interrupted writes are removed as well. Unrecognized files are
/// left alone.
#[instrument(skip(conn, store))]
pub fn reconcile(
    conn: &mut DbConn,
    store: &ContentStore,
    grace: Duration,
    now: SystemTime,
) -> Result<ReconcileReport> {
    let cutoff = now.checked_sub(grace).unwrap_or(SystemTime::UNIX_EPOCH);
    let is_old = |modified: SystemTime| modified < cutoff;

    let files = store.list_files()?;
    let mut report = ReconcileReport {
        scanned: files.len(),
        ..Default::default()
    };

    let mut candidates: HashMap<Digest, Vec<String>> = HashMap::new();
    for file in files {
        let file_name = file.key.rsplit('/').next().unwrap_or_default();
        if file_name.starts_with(".tmp") {
            if is_old(file.modified) {
                remove_counted(store, &file.key, &mut report);
            }
            continue;
        }
        let Some(digest) = storage_key::digest_from_key(&file.key) else {
            continue;
        };
        if is_old(file.modified) {
            candidates.entry(digest).or_default().push(file.key);
        } else {
            report.kept_recent += 1;
        }
    }

    let digests: Vec<Digest> = candidates.keys().cloned().collect();
    for chunk in digests.chunks(DIGEST_QUERY_CHUNK) {
        let referenced = repository::image::get_referenced_digests(conn, chunk)?;
        for digest in chunk.iter().filter(|d| !referenced.contains(*d)) {
            let Some(keys) = candidates.get(digest) else {
                continue;
            };
            for key in keys {
                // an ingest may have reused the file since we listed it
                match store.modified(key) {
                    Ok(modified) if is_old(modified) => {
                        remove_counted(store, key, &mut report);
                    }
                    Ok(_) => report.kept_recent += 1,
                    Err(StoreError::NotFound(_)) => {}
                    Err(err) => {
                        warn!(%key, error = %err, "could not stat file during sweep");
                        report.failed += 1;
                    }
                }
            }
        }
    }

    if report.removed > 0 || report.failed > 0 {
        info!(?report, "reconciled store");
    } else {
        debug!(?report, "reconciled store");
    }
    Ok(report)
}

fn remove_counted(store: &ContentStore, key: &str, report: &mut ReconcileReport) {
    match store.remove(key) {
        Ok(()) => report.removed += 1,
        Err(StoreError::NotFound(_)) => {}
        Err(err) => {
            warn!(%key, error = %err, "could not remove orphaned file");
            report.failed += 1;
        }
    }
}
