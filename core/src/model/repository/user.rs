use chrono::{DateTime, Utc};
use diesel::prelude::*;
use eyre::{Context, Result};
use tracing::instrument;

use crate::model::{repository::db_entity::DbUser, util::datetime_to_db_repr, User, UserId};

use super::db::DbConn;
use super::schema;

#[instrument(skip(conn, password_hash), level = "trace")]
pub fn insert_user(
    conn: &mut DbConn,
    username: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> Result<UserId> {
    use schema::User;
    let id = diesel::insert_into(User::table)
        .values((
            User::username.eq(username.to_lowercase()),
            User::password_hash.eq(password_hash),
            User::created_at.eq(datetime_to_db_repr(&now)),
        ))
        .returning(User::user_id)
        .get_result(conn)
        .wrap_err("error inserting into table User")?;
    Ok(UserId(id))
}

#[instrument(skip(conn), level = "trace")]
pub fn count_users(conn: &mut DbConn) -> Result<i64> {
    use schema::User;
    User::table
        .count()
        .get_result(conn)
        .wrap_err("error querying table User")
}

/// Usernames are matched case insensitively
#[instrument(skip(conn), level = "trace")]
pub fn get_user_by_username(conn: &mut DbConn, username: &str) -> Result<Option<User>> {
    use schema::User;
    let db_user: Option<DbUser> = User::table
        .filter(User::username.eq(username.to_lowercase()))
        .select(DbUser::as_select())
        .first(conn)
        .optional()
        .wrap_err("error querying table User")?;
    db_user.map(|u| u.try_into()).transpose()
}
