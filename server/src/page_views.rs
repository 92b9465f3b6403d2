use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, Method},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use eyre::Result;
use tracing::{debug, warn, Instrument};

use folio_core::{
    deadpool_diesel, interact,
    model::{
        repository::{self, analytics::RecordPageView, db::DbPool},
        ProjectId,
    },
    processing::hash::hash_ip,
};

use crate::app_state::SharedState;

const UNTRACKED_PREFIXES: &[&str] = &["/api/admin", "/api/login", "/api/logout", "/uploads"];

fn is_tracked(method: &Method, path: &str) -> bool {
    method == Method::GET && !UNTRACKED_PREFIXES.iter().any(|p| path.starts_with(p))
}

fn project_id_from_path(path: &str) -> Option<ProjectId> {
    let id = path.strip_prefix("/api/projects/")?;
    id.parse::<i64>().ok().map(ProjectId)
}

/// First hop of X-Forwarded-For if present, otherwise the peer address
fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_owned())
        .filter(|ip| !ip.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

/// Middleware recording a page view for every successful public GET.
/// The insert runs detached from the request and its failures are only logged.
pub async fn record_page_view(
    State(app_state): State<SharedState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_tracked(request.method(), request.uri().path()) {
        return next.run(request).await;
    }
    let page_path = request.uri().path().to_owned();
    let referrer = request
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let ip = client_ip(request.headers(), connect_info.map(|ConnectInfo(addr)| addr));

    let response = next.run(request).await;
    if response.status().is_success() {
        let view = RecordPageView {
            project_id: project_id_from_path(&page_path),
            page_path,
            referrer,
            ip_hash: hash_ip(&ip),
            viewed_at: Utc::now(),
        };
        let pool = app_state.pool.clone();
        tokio::spawn(
            async move {
                if let Err(err) = insert_page_view(pool, view).await {
                    warn!(%err, "could not record page view");
                }
            }
            .in_current_span(),
        );
    }
    response
}

async fn insert_page_view(pool: DbPool, view: RecordPageView) -> Result<()> {
    let conn = pool.get().await?;
    let id = interact!(conn, move |conn| {
        repository::analytics::insert_page_view(conn, &view)
    })
    .await??;
    debug!(%id, "recorded page view");
    Ok(())
}
