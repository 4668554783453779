use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 12, max = 128, message = "Password must be 12-128 characters"))]
    pub password: String,

    #[validate(length(max = 100, message = "Display name too long"))]
    pub display_name: Option<String>,

    /// Therapy discipline code ("slp", "ot", "pt", ...).
    #[validate(length(min = 1, max = 16, message = "Service type code is required"))]
    pub service_type_code: String,

    #[validate(length(max = 32, message = "License number too long"))]
    pub license_number: Option<String>,

    #[validate(length(min = 2, max = 2, message = "License state must be a 2-letter code"))]
    pub license_state: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub user: crate::models::UserResponse,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct VerifyRequest {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    pub message: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 12, max = 128, message = "Password must be 12-128 characters"))]
    pub new_password: String,
}
