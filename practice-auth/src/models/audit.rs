//! Login/registration attempt audit trail.
//!
//! Append-only: one row per attempt, including attempts against emails that do
//! not exist (enumeration defense requires those to be indistinguishable).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::User;

#[derive(Debug, Clone)]
pub struct LoginAudit {
    pub audit_id: Uuid,
    pub email: String,
    pub license_number: Option<String>,
    pub license_state: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl LoginAudit {
    /// Record a successful attempt for a known user.
    pub fn success(user: &User, ip: Option<&str>, user_agent: Option<&str>) -> Self {
        Self {
            audit_id: Uuid::new_v4(),
            email: user.email.clone(),
            license_number: user.license_number.clone(),
            license_state: user.license_state.clone(),
            success: true,
            failure_reason: None,
            ip: ip.map(str::to_string),
            user_agent: user_agent.map(str::to_string),
            created_utc: Utc::now(),
        }
    }

    /// Record a failed attempt. `user` is `None` when the email is unknown.
    pub fn failure(
        email: &str,
        user: Option<&User>,
        reason: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Self {
        Self {
            audit_id: Uuid::new_v4(),
            email: email.to_string(),
            license_number: user.and_then(|u| u.license_number.clone()),
            license_state: user.and_then(|u| u.license_state.clone()),
            success: false,
            failure_reason: Some(reason.to_string()),
            ip: ip.map(str::to_string),
            user_agent: user_agent.map(str::to_string),
            created_utc: Utc::now(),
        }
    }
}
