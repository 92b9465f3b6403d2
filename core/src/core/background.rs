use std::time::{Duration, SystemTime};

use chrono::Utc;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info_span, Instrument};

use crate::{
    auth,
    catalog::cleanup,
    config::CleanupConfig,
    core::storage::ContentStore,
    interact,
    model::repository::db::DbPool,
};

/// Periodic maintenance: sweeping orphaned files and expired sessions.
pub struct BackgroundTasks {
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasks {
    pub fn start(pool: DbPool, store: ContentStore, config: &CleanupConfig) -> BackgroundTasks {
        let cancel = CancellationToken::new();
        let reconciler = tokio::spawn(
            run_reconciler(
                pool.clone(),
                store,
                config.reconcile_interval,
                config.grace_period,
                cancel.clone(),
            )
            .instrument(info_span!("reconciler")),
        );
        let session_cleanup = tokio::spawn(
            run_session_cleanup(pool, config.session_cleanup_interval, cancel.clone())
                .instrument(info_span!("session_cleanup")),
        );
        BackgroundTasks {
            cancel,
            handles: vec![reconciler, session_cleanup],
        }
    }

    /// Stops the tasks, waiting for a running sweep to finish
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            if let Err(err) = handle.await {
                error!(%err, "background task panicked");
            }
        }
    }
}

async fn run_reconciler(
    pool: DbPool,
    store: ContentStore,
    period: Duration,
    grace: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        let store = store.clone();
        let result = async {
            let conn = pool.get().await?;
            interact!(conn, move |conn| {
                cleanup::reconcile(conn, &store, grace, SystemTime::now())
            })
            .await?
        }
        .await;
        if let Err(err) = result {
            error!("error sweeping unreferenced files: {:?}", err);
        }
    }
}

async fn run_session_cleanup(pool: DbPool, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {}
        }
        let result = async {
            let conn = pool.get().await?;
            interact!(conn, move |conn| auth::cleanup_expired_sessions(conn, Utc::now())).await?
        }
        .await;
        if let Err(err) = result {
            error!("error removing expired sessions: {:?}", err);
        }
    }
}
