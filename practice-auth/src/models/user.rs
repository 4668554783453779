//! User model - practitioner accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// User account state codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Registered but email not yet verified.
    Pending,
    Active,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Pending => "pending",
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
        }
    }
}

/// Practitioner account.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    /// Therapy discipline the practitioner provides (e.g. "slp", "ot", "pt").
    pub service_type_code: String,
    pub license_number: Option<String>,
    pub license_state: Option<String>,
    pub status_code: String,
    pub email_verified: bool,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Create a new unverified account in the pending state.
    pub fn new(
        email: String,
        password_hash: String,
        display_name: Option<String>,
        service_type_code: String,
        license_number: Option<String>,
        license_state: Option<String>,
    ) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            password_hash,
            display_name,
            service_type_code,
            license_number,
            license_state,
            status_code: UserStatus::Pending.as_str().to_string(),
            email_verified: false,
            created_utc: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status_code == UserStatus::Active.as_str()
    }

    /// Convert to a response shape without the password hash.
    pub fn sanitized(&self) -> UserResponse {
        UserResponse::from(self.clone())
    }
}

/// User response for the API (no sensitive fields).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserResponse {
    pub user_id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub service_type_code: String,
    pub license_number: Option<String>,
    pub license_state: Option<String>,
    pub status_code: String,
    pub email_verified: bool,
    pub created_utc: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            email: u.email,
            display_name: u.display_name,
            service_type_code: u.service_type_code,
            license_number: u.license_number,
            license_state: u.license_state,
            status_code: u.status_code,
            email_verified: u.email_verified,
            created_utc: u.created_utc,
        }
    }
}
