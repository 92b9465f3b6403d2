//! The single admin account and its cookie sessions.

use std::time::Duration;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use diesel::Connection;
use eyre::eyre;
use rand::RngCore;
use tracing::{info, instrument, warn};

use crate::model::{
    repository::{self, db::DbConn},
    Session, UserId,
};

pub const ADMIN_USERNAME: &str = "admin";
const SESSION_ID_BYTES: usize = 32;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("no admin user exists and no admin_password is configured")]
    MissingAdminPassword,
    #[error("{0}")]
    Other(eyre::Report),
}

impl From<eyre::Report> for AuthError {
    fn from(value: eyre::Report) -> Self {
        AuthError::Other(value)
    }
}

impl From<diesel::result::Error> for AuthError {
    fn from(value: diesel::result::Error) -> Self {
        AuthError::Other(eyre::Report::new(value))
    }
}

/// argon2id PHC string with a random salt
pub fn hash_password(password: &str) -> eyre::Result<String> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| eyre!("error hashing password: {}", err))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            warn!(%err, "stored password hash is not a valid PHC string");
            false
        }
    }
}

pub fn generate_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Creates the admin account on first start. Returns true if it was created.
#[instrument(skip(conn, initial_password))]
pub fn ensure_admin_user(
    conn: &mut DbConn,
    initial_password: Option<&str>,
) -> Result<bool, AuthError> {
    if repository::user::count_users(conn)? > 0 {
        return Ok(false);
    }
    let password = initial_password.ok_or(AuthError::MissingAdminPassword)?;
    let password_hash = hash_password(password)?;
    repository::user::insert_user(conn, ADMIN_USERNAME, &password_hash, Utc::now())?;
    info!("created admin user");
    Ok(true)
}

/// Checks the credentials and replaces all of the user's sessions with a new one
#[instrument(skip(conn, password, ttl, now))]
pub fn login(
    conn: &mut DbConn,
    username: &str,
    password: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<Session, AuthError> {
    let user = repository::user::get_user_by_username(conn, username)?
        .ok_or(AuthError::InvalidCredentials)?;
    if !verify_password(password, &user.password_hash) {
        return Err(AuthError::InvalidCredentials);
    }
    let ttl = chrono::Duration::from_std(ttl).map_err(|err| eyre!("invalid session ttl: {}", err))?;
    let session = Session {
        id: generate_session_id(),
        user_id: user.id,
        created_at: now,
        expires_at: now + ttl,
    };
    conn.immediate_transaction(|conn| {
        repository::session::delete_sessions_for_user(conn, user.id)?;
        repository::session::insert_session(conn, &session)?;
        Ok::<_, AuthError>(())
    })?;
    info!(user_id = %user.id, "logged in");
    Ok(session)
}

/// The user a session belongs to, if it exists and has not expired
#[instrument(skip(conn, session_id), level = "debug")]
pub fn validate_session(
    conn: &mut DbConn,
    session_id: &str,
    now: DateTime<Utc>,
) -> eyre::Result<Option<UserId>> {
    let session = repository::session::get_valid_session(conn, session_id, now)?;
    Ok(session.map(|s| s.user_id))
}

#[instrument(skip(conn, session_id))]
pub fn logout(conn: &mut DbConn, session_id: &str) -> eyre::Result<()> {
    repository::session::delete_session(conn, session_id)?;
    Ok(())
}

#[instrument(skip(conn))]
pub fn cleanup_expired_sessions(conn: &mut DbConn, now: DateTime<Utc>) -> eyre::Result<usize> {
    let deleted = repository::session::delete_expired_sessions(conn, now)?;
    if deleted > 0 {
        info!(deleted, "removed expired sessions");
    }
    Ok(deleted)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::repository::db::open_in_memory_and_migrate;
    use chrono::SubsecRound;
    use claims::{assert_matches, assert_none, assert_ok, assert_some, assert_some_eq};
    use pretty_assertions::assert_eq;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn password_hash_verifies() {
        let hash = assert_ok!(hash_password("correct horse"));
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not a hash"));
    }

    #[test]
    fn session_ids_are_url_safe_and_unique() {
        let a = generate_session_id();
        let b = generate_session_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert!(a
            .bytes()
            .all(|c| c.is_ascii_alphanumeric() || c == b'-' || c == b'_'));
    }

    #[test]
    fn admin_is_created_once() {
        let mut conn = open_in_memory_and_migrate();
        assert_matches!(
            ensure_admin_user(&mut conn, None),
            Err(AuthError::MissingAdminPassword)
        );
        assert_eq!(assert_ok!(ensure_admin_user(&mut conn, Some("pw"))), true);
        assert_eq!(assert_ok!(ensure_admin_user(&mut conn, Some("other"))), false);
        assert_eq!(assert_ok!(repository::user::count_users(&mut conn)), 1);
    }

    #[test]
    fn login_validate_logout() {
        let mut conn = open_in_memory_and_migrate();
        assert_ok!(ensure_admin_user(&mut conn, Some("secret")));
        let now = Utc::now().trunc_subsecs(3);

        assert_matches!(
            login(&mut conn, "admin", "nope", DAY, now),
            Err(AuthError::InvalidCredentials)
        );
        assert_matches!(
            login(&mut conn, "nobody", "secret", DAY, now),
            Err(AuthError::InvalidCredentials)
        );

        // usernames are case insensitive
        let session = assert_ok!(login(&mut conn, "Admin", "secret", DAY, now));
        assert_eq!(session.expires_at, now + chrono::Duration::hours(24));
        assert_some_eq!(
            assert_ok!(validate_session(&mut conn, &session.id, now)),
            session.user_id
        );

        // expired at exactly expires_at
        assert_none!(assert_ok!(validate_session(
            &mut conn,
            &session.id,
            session.expires_at
        )));

        assert_ok!(logout(&mut conn, &session.id));
        assert_none!(assert_ok!(validate_session(&mut conn, &session.id, now)));
    }

    #[test]
    fn new_login_replaces_old_sessions() {
        let mut conn = open_in_memory_and_migrate();
        assert_ok!(ensure_admin_user(&mut conn, Some("secret")));
        let now = Utc::now().trunc_subsecs(3);
        let first = assert_ok!(login(&mut conn, "admin", "secret", DAY, now));
        let second = assert_ok!(login(&mut conn, "admin", "secret", DAY, now));
        assert_none!(assert_ok!(validate_session(&mut conn, &first.id, now)));
        assert_some!(assert_ok!(validate_session(&mut conn, &second.id, now)));
    }

    #[test]
    fn expired_sessions_are_cleaned_up() {
        let mut conn = open_in_memory_and_migrate();
        assert_ok!(ensure_admin_user(&mut conn, Some("secret")));
        let then = Utc::now().trunc_subsecs(3) - chrono::Duration::days(2);
        let session = assert_ok!(login(&mut conn, "admin", "secret", DAY, then));
        let now = Utc::now();
        assert_eq!(assert_ok!(cleanup_expired_sessions(&mut conn, now)), 1);
        assert_eq!(assert_ok!(cleanup_expired_sessions(&mut conn, now)), 0);
        assert_none!(assert_ok!(validate_session(&mut conn, &session.id, then)));
    }
}
