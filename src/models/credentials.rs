use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Login credentials of a user. Each user has at most one set.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Credentials {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Credentials {
    /// Creates credentials not yet bound to a user (`user_id` is nil until
    /// attached with `User::with_credentials`).
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }
}
