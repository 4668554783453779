//! Authentication handlers.
//!
//! The login handler is a thin shim: every security property (lockout,
//! uniform failures, response padding) lives in the service layer so it also
//! holds for callers that bypass HTTP.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::dtos::auth::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, RegisterResponse, VerifyRequest,
    VerifyResponse,
};
use crate::dtos::ErrorResponse;
use crate::middleware::AuthUser;
use crate::services::LoginResult;
use crate::utils::validation::ValidatedJson;
use crate::AppState;
use service_core::error::AppError;

fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Log in with email and password.
///
/// POST /auth/login
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login succeeded", body = LoginResult),
        (status = 401, description = "Invalid credentials or account state", body = LoginResult),
        (status = 423, description = "Account temporarily locked", body = LoginResult)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> (StatusCode, Json<LoginResult>) {
    let ip = client_ip(&headers);
    let agent = user_agent(&headers);

    let result = state
        .auth_service
        .login(&req, ip.as_deref(), agent.as_deref())
        .await;

    let status = if result.success {
        StatusCode::OK
    } else if result.is_locked {
        StatusCode::LOCKED
    } else {
        StatusCode::UNAUTHORIZED
    };

    (status, Json(result))
}

/// Register a new practitioner account.
///
/// POST /auth/register
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification email sent", body = RegisterResponse),
        (status = 400, description = "Weak or breached password", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let ip = client_ip(&headers);
    let agent = user_agent(&headers);
    let user = state
        .auth_service
        .register(&req, ip.as_deref(), agent.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account created. Please check your email to verify your address."
                .to_string(),
            user,
        }),
    ))
}

/// Verify an email address with a token from the verification email.
///
/// GET /auth/verify?token=...
#[utoipa::path(
    get,
    path = "/auth/verify",
    params(VerifyRequest),
    responses(
        (status = 200, description = "Email verified", body = VerifyResponse),
        (status = 400, description = "Invalid or expired token", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn verify_email(
    State(state): State<AppState>,
    Query(req): Query<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    state.auth_service.verify_email(&req.token).await?;

    Ok(Json(VerifyResponse {
        message: "Email verified. You can now log in.".to_string(),
    }))
}

/// Change the authenticated user's password.
///
/// POST /users/me/password
#[utoipa::path(
    post,
    path = "/users/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = VerifyResponse),
        (status = 400, description = "Policy violation or reused password", body = ErrorResponse),
        (status = 401, description = "Current password incorrect", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(req): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let user_id = claims
        .sub
        .parse()
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid subject claim")))?;

    state.auth_service.change_password(user_id, &req).await?;

    Ok(Json(VerifyResponse {
        message: "Password changed.".to_string(),
    }))
}
