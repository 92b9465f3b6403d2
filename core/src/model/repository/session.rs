use chrono::{DateTime, Utc};
use diesel::prelude::*;
use eyre::{Context, Result};
use tracing::instrument;

use crate::model::{
    repository::db_entity::DbSession, util::datetime_to_db_repr, Session, UserId,
};

use super::db::DbConn;
use super::schema;

#[instrument(skip(conn, session), level = "trace")]
pub fn insert_session(conn: &mut DbConn, session: &Session) -> Result<()> {
    use schema::Session;
    diesel::insert_into(Session::table)
        .values((
            Session::session_id.eq(&session.id),
            Session::user_id.eq(session.user_id.0),
            Session::created_at.eq(datetime_to_db_repr(&session.created_at)),
            Session::expires_at.eq(datetime_to_db_repr(&session.expires_at)),
        ))
        .execute(conn)
        .wrap_err("error inserting into table Session")?;
    Ok(())
}

/// Only returns sessions that have not expired at `now`
#[instrument(skip(conn, session_id), level = "trace")]
pub fn get_valid_session(
    conn: &mut DbConn,
    session_id: &str,
    now: DateTime<Utc>,
) -> Result<Option<Session>> {
    use schema::Session;
    let db_session: Option<DbSession> = Session::table
        .filter(Session::session_id.eq(session_id))
        .filter(Session::expires_at.gt(datetime_to_db_repr(&now)))
        .select(DbSession::as_select())
        .first(conn)
        .optional()
        .wrap_err("error querying table Session")?;
    db_session.map(|s| s.try_into()).transpose()
}

#[instrument(skip(conn, session_id), level = "trace")]
pub fn delete_session(conn: &mut DbConn, session_id: &str) -> Result<usize> {
    use schema::Session;
    diesel::delete(Session::table.filter(Session::session_id.eq(session_id)))
        .execute(conn)
        .wrap_err("error deleting from table Session")
}

#[instrument(skip(conn), level = "trace")]
pub fn delete_sessions_for_user(conn: &mut DbConn, user_id: UserId) -> Result<usize> {
    use schema::Session;
    diesel::delete(Session::table.filter(Session::user_id.eq(user_id.0)))
        .execute(conn)
        .wrap_err("error deleting from table Session")
}

/// Returns the number of sessions removed
#[instrument(skip(conn), level = "trace")]
pub fn delete_expired_sessions(conn: &mut DbConn, now: DateTime<Utc>) -> Result<usize> {
    use schema::Session;
    diesel::delete(Session::table.filter(Session::expires_at.le(datetime_to_db_repr(&now))))
        .execute(conn)
        .wrap_err("error deleting from table Session")
}
