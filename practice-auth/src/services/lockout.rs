//! Account lockout tracking.
//!
//! Lockout state is derived lazily from the persisted failure counter; there
//! is no background timer and the service holds no mutable state. Concurrent
//! failure recording is serialized by the store's atomic upsert, so the
//! counter stays correct across multiple service instances.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use service_core::error::AppError;
use std::sync::Arc;

use crate::config::SecurityConfig;
use crate::models::FailureRecord;

/// Persisted failure counter, keyed by email.
#[async_trait]
pub trait LoginAttemptStore: Send + Sync {
    /// Atomically increment the failure counter and return the updated record.
    /// A record whose last failure is at or before `stale_before` restarts at
    /// 1, matching the read side treating an exactly-elapsed window as
    /// expired.
    async fn record_failure(
        &self,
        email: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
        stale_before: DateTime<Utc>,
    ) -> Result<FailureRecord, AppError>;

    async fn find_failures(&self, email: &str) -> Result<Option<FailureRecord>, AppError>;

    async fn clear_failures(&self, email: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone)]
pub struct LockoutPolicy {
    pub max_failed_attempts: u32,
    pub lockout_duration: Duration,
}

impl LockoutPolicy {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            max_failed_attempts: config.max_failed_attempts,
            lockout_duration: Duration::minutes(config.lockout_duration_minutes),
        }
    }
}

/// Derived lockout state for one email at one point in time.
#[derive(Debug, Clone)]
pub struct LockoutStatus {
    pub is_locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
    pub remaining_attempts: u32,
}

impl LockoutStatus {
    /// Human-readable message for a locked account.
    pub fn lock_message(&self, now: DateTime<Utc>) -> String {
        match self.locked_until {
            Some(until) if self.is_locked => {
                let secs = (until - now).num_seconds().max(1);
                let human = if secs < 60 {
                    format!("{} seconds", secs)
                } else {
                    format!("{} minutes", (secs + 59) / 60)
                };
                format!(
                    "Account is temporarily locked due to repeated failed login attempts. Try again in {}.",
                    human
                )
            }
            _ => "Account is not locked.".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct LockoutService {
    store: Arc<dyn LoginAttemptStore>,
    policy: LockoutPolicy,
}

impl LockoutService {
    pub fn new(store: Arc<dyn LoginAttemptStore>, policy: LockoutPolicy) -> Self {
        Self { store, policy }
    }

    /// Current lockout state for an email. An elapsed lock reads as unlocked
    /// with the full attempt budget; the stale row self-heals on the next
    /// failure or `clear`.
    pub async fn check(&self, email: &str) -> Result<LockoutStatus, AppError> {
        let record = self.store.find_failures(email).await?;
        Ok(self.derive(record.as_ref(), Utc::now()))
    }

    /// Record one failed attempt and return the updated state.
    pub async fn record_failure(
        &self,
        email: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<LockoutStatus, AppError> {
        let now = Utc::now();
        let stale_before = now - self.policy.lockout_duration;
        let record = self
            .store
            .record_failure(email, ip, user_agent, stale_before)
            .await?;
        Ok(self.derive(Some(&record), now))
    }

    pub async fn clear(&self, email: &str) -> Result<(), AppError> {
        self.store.clear_failures(email).await
    }

    fn derive(&self, record: Option<&FailureRecord>, now: DateTime<Utc>) -> LockoutStatus {
        let threshold = self.policy.max_failed_attempts;

        let Some(record) = record else {
            return LockoutStatus {
                is_locked: false,
                locked_until: None,
                remaining_attempts: threshold,
            };
        };

        let window_end = record.last_failure_utc + self.policy.lockout_duration;
        if window_end <= now {
            // Failures expired with the window.
            return LockoutStatus {
                is_locked: false,
                locked_until: None,
                remaining_attempts: threshold,
            };
        }

        let count = record.failure_count.max(0) as u32;
        if count >= threshold {
            LockoutStatus {
                is_locked: true,
                locked_until: Some(window_end),
                remaining_attempts: 0,
            }
        } else {
            LockoutStatus {
                is_locked: false,
                locked_until: None,
                remaining_attempts: threshold - count,
            }
        }
    }
}
