use chrono::{DateTime, Utc};

use super::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// random, url safe base64. Also the cookie value
    pub id: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
