use diesel::{Queryable, Selectable};

use crate::model::{util::datetime_from_db_repr, Session, UserId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = super::super::schema::Session)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbSession {
    pub session_id: String,
    pub user_id: i64,
    pub created_at: i64,
    pub expires_at: i64,
}

impl TryFrom<DbSession> for Session {
    type Error = eyre::Report;

    fn try_from(value: DbSession) -> Result<Self, Self::Error> {
        Ok(Session {
            id: value.session_id,
            user_id: UserId(value.user_id),
            created_at: datetime_from_db_repr(value.created_at)?,
            expires_at: datetime_from_db_repr(value.expires_at)?,
        })
    }
}
