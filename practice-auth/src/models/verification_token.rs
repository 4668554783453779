use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Email verification token; consumed on use.
#[derive(Debug, Clone, FromRow)]
pub struct VerificationToken {
    pub token: String,
    pub user_id: Uuid,
    pub expiry_utc: DateTime<Utc>,
}

impl VerificationToken {
    pub fn new(user_id: Uuid, token: String, ttl_hours: i64) -> Self {
        Self {
            token,
            user_id,
            expiry_utc: Utc::now() + Duration::hours(ttl_hours),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expiry_utc <= Utc::now()
    }
}
