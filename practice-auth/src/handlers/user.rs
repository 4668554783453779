//! User profile handlers.

use axum::{extract::State, Json};

use crate::dtos::ErrorResponse;
use crate::middleware::AuthUser;
use crate::models::UserResponse;
use crate::services::auth::UserStore;
use crate::AppState;
use service_core::error::AppError;

/// Get the authenticated user's profile.
///
/// GET /users/me
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserResponse>, AppError> {
    let user_id = claims
        .sub
        .parse()
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid subject claim")))?;

    let user = state
        .db
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))?;

    Ok(Json(user.sanitized()))
}
