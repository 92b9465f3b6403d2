use diesel::{Queryable, Selectable};

use crate::model::{util::datetime_from_db_repr, User, UserId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = super::super::schema::User)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DbUser {
    pub user_id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

impl TryFrom<DbUser> for User {
    type Error = eyre::Report;

    fn try_from(value: DbUser) -> Result<Self, Self::Error> {
        Ok(User {
            id: UserId(value.user_id),
            username: value.username,
            password_hash: value.password_hash,
            created_at: datetime_from_db_repr(value.created_at)?,
        })
    }
}
