//! Password rotation policy.
//!
//! Expiry is computed from the most recent password-history entry. A user
//! with no history is treated as freshly changed so newly migrated accounts
//! are not forced through a rotation on first login.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::models::PasswordHistoryEntry;
use crate::utils::password::{verify_password, Password, PasswordHashString};

#[async_trait]
pub trait PasswordHistoryStore: Send + Sync {
    async fn append(&self, entry: &PasswordHistoryEntry) -> Result<(), AppError>;

    /// Timestamp of the most recent password change, if any.
    async fn latest_change(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, AppError>;

    /// The `limit` most recent hashes, newest first.
    async fn recent_hashes(&self, user_id: Uuid, limit: u32) -> Result<Vec<String>, AppError>;
}

#[derive(Debug, Clone)]
pub struct ExpiryPolicy {
    pub interval_days: i64,
    pub warning_days: i64,
    pub history_depth: u32,
}

impl ExpiryPolicy {
    pub fn from_config(config: &SecurityConfig) -> Self {
        Self {
            interval_days: config.password_expiry_days,
            warning_days: config.password_expiry_warning_days,
            history_depth: config.password_history_depth,
        }
    }
}

/// Outcome of the expiry check at login time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChangeRequirement {
    pub change_required: bool,
    pub days_until_expiry: i64,
}

#[derive(Clone)]
pub struct PasswordExpiryService {
    store: Arc<dyn PasswordHistoryStore>,
    policy: ExpiryPolicy,
}

impl PasswordExpiryService {
    pub fn new(store: Arc<dyn PasswordHistoryStore>, policy: ExpiryPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn check_change_required(
        &self,
        user_id: Uuid,
    ) -> Result<PasswordChangeRequirement, AppError> {
        let last_change = self.store.latest_change(user_id).await?;
        Ok(self.requirement_from(last_change, Utc::now()))
    }

    /// True when `candidate` matches any of the most recent stored hashes.
    pub async fn is_password_reused(
        &self,
        user_id: Uuid,
        candidate: &Password,
    ) -> Result<bool, AppError> {
        let hashes = self
            .store
            .recent_hashes(user_id, self.policy.history_depth)
            .await?;

        for hash in hashes {
            if verify_password(candidate, &PasswordHashString::new(hash)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Append the new hash to the history after a successful change.
    pub async fn record_change(&self, user_id: Uuid, new_hash: &str) -> Result<(), AppError> {
        let entry = PasswordHistoryEntry::new(user_id, new_hash.to_string());
        self.store.append(&entry).await
    }

    fn requirement_from(
        &self,
        last_change: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> PasswordChangeRequirement {
        let Some(changed) = last_change else {
            // No history reads as freshly changed.
            return PasswordChangeRequirement {
                change_required: false,
                days_until_expiry: self.policy.interval_days,
            };
        };

        let days_since_change = (now - changed).num_days();
        let days_until_expiry = self.policy.interval_days - days_since_change;

        PasswordChangeRequirement {
            change_required: days_until_expiry <= 0,
            days_until_expiry,
        }
    }

    /// True when the login response should carry an expiry warning.
    pub fn within_warning_window(&self, requirement: &PasswordChangeRequirement) -> bool {
        !requirement.change_required && requirement.days_until_expiry <= self.policy.warning_days
    }
}
