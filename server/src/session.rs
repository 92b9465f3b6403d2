use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use tracing::Instrument;

use folio_core::{auth, deadpool_diesel, interact, model::UserId};

use crate::{
    app_state::SharedState,
    http_error::{HttpError, RequestError},
};

pub const SESSION_COOKIE: &str = "session";

/// Extracting this rejects the request with 401 unless it carries a valid
/// session cookie.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub user_id: UserId,
    pub session_id: String,
}

#[async_trait]
impl FromRequestParts<SharedState> for AdminSession {
    type Rejection = HttpError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session_id = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .filter(|id| !id.is_empty())
            .ok_or(RequestError::Unauthorized)?;
        let conn = state.pool.get().in_current_span().await?;
        let id = session_id.clone();
        let user_id = interact!(conn, move |conn| {
            auth::validate_session(conn, &id, Utc::now())
        })
        .await??
        .ok_or(RequestError::Unauthorized)?;
        Ok(AdminSession {
            user_id,
            session_id,
        })
    }
}

/// Expiry is enforced by the session table, so the cookie itself has no
/// max-age and ends with the browser session.
pub fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .build()
}

pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
