use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Failed-attempt counter row, keyed by email in the backing store.
///
/// Lockout state is always derived from this record at read time; it is never
/// persisted separately.
#[derive(Debug, Clone, FromRow)]
pub struct FailureRecord {
    pub failure_count: i32,
    pub last_failure_utc: DateTime<Utc>,
}
