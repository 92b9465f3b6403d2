use axum::{
    extract::{FromRequest, Request, State},
    http::{header::CONTENT_TYPE, StatusCode},
    routing::post,
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use tracing::{info, Instrument};

use folio_core::{auth, deadpool_diesel, interact};

use crate::{
    app_state::SharedState,
    http_error::{ApiResult, RequestError},
    schema::{LoginRequest, LoginResponse},
    session::{self, AdminSession},
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
}

/// Accepts the credentials as JSON or as an urlencoded form
async fn read_login_request(request: Request, state: &SharedState) -> ApiResult<LoginRequest> {
    let is_json = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));
    let login_request = if is_json {
        Json::<LoginRequest>::from_request(request, state)
            .await
            .map_err(|rejection| RequestError::BadRequest(rejection.body_text()))?
            .0
    } else {
        Form::<LoginRequest>::from_request(request, state)
            .await
            .map_err(|rejection| RequestError::BadRequest(rejection.body_text()))?
            .0
    };
    Ok(login_request)
}

#[tracing::instrument(skip(app_state, jar, request))]
pub async fn login(
    State(app_state): State<SharedState>,
    jar: CookieJar,
    request: Request,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let LoginRequest { username, password } = read_login_request(request, &app_state).await?;
    let ttl = app_state.config.session_ttl;
    let conn = app_state.pool.get().in_current_span().await?;
    let session = interact!(conn, move |conn| {
        Ok(auth::login(conn, &username, &password, ttl, Utc::now()))
    })
    .await???;
    let response = LoginResponse {
        expires_at: session.expires_at,
    };
    Ok((jar.add(session::session_cookie(session.id)), Json(response)))
}

#[tracing::instrument(skip_all)]
pub async fn logout(
    State(app_state): State<SharedState>,
    admin: AdminSession,
    jar: CookieJar,
) -> ApiResult<(CookieJar, StatusCode)> {
    let conn = app_state.pool.get().in_current_span().await?;
    let session_id = admin.session_id.clone();
    interact!(conn, move |conn| auth::logout(conn, &session_id)).await??;
    info!(user_id = %admin.user_id, "logged out");
    Ok((session::clear_session_cookie(jar), StatusCode::NO_CONTENT))
}
