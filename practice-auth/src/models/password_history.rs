use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// One entry per successful password set (registration or change).
#[derive(Debug, Clone, FromRow)]
pub struct PasswordHistoryEntry {
    pub entry_id: Uuid,
    pub user_id: Uuid,
    pub password_hash: String,
    pub changed_utc: DateTime<Utc>,
}

impl PasswordHistoryEntry {
    pub fn new(user_id: Uuid, password_hash: String) -> Self {
        Self {
            entry_id: Uuid::new_v4(),
            user_id,
            password_hash,
            changed_utc: Utc::now(),
        }
    }
}
