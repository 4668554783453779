//! Authentication orchestration.
//!
//! The login path is deliberately rigid about ordering and timing:
//!
//! 1. Lockout is checked first and short-circuits everything else.
//! 2. Password verification runs for every non-locked attempt, against the
//!    stored hash when the account exists and against a configured dummy hash
//!    when it does not, so unknown emails cost the same work as wrong
//!    passwords.
//! 3. Unknown email and wrong password produce byte-identical responses.
//! 4. The whole attempt is padded to a minimum wall-clock duration before the
//!    response leaves the service, covering the error path as well.

use async_trait::async_trait;
use rand::RngCore;
use serde::Serialize;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dtos::auth::{ChangePasswordRequest, LoginRequest, RegisterRequest};
use crate::models::{LoginAudit, User, UserResponse, VerificationToken};
use crate::services::audit::AuditService;
use crate::services::error::ServiceError;
use crate::services::jwt::JwtService;
use crate::services::lockout::LockoutService;
use crate::services::mailer::VerificationMailer;
use crate::services::password_expiry::PasswordExpiryService;
use crate::services::password_policy::PasswordPolicyService;
use crate::utils::password::{hash_password, verify_password, Password, PasswordHashString};

const VERIFICATION_TOKEN_TTL_HOURS: i64 = 24;

const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password.";
const MSG_EMAIL_UNVERIFIED: &str = "Please verify your email address before logging in.";
const MSG_ACCOUNT_INACTIVE: &str = "Your account is not active. Please contact support.";
const MSG_LOGIN_ERROR: &str = "An error occurred during login. Please try again later.";
const MSG_PASSWORD_EXPIRED: &str = "Your password has expired and must be changed.";
const MSG_LOGIN_OK: &str = "Login successful";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;
    async fn insert(&self, user: &User) -> Result<(), AppError>;
    /// Flips `email_verified` and promotes a pending account to active.
    async fn mark_email_verified(&self, user_id: Uuid) -> Result<(), AppError>;
    async fn update_password_hash(&self, user_id: Uuid, hash: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait VerificationTokenStore: Send + Sync {
    async fn insert(&self, token: &VerificationToken) -> Result<(), AppError>;
    async fn find(&self, token: &str) -> Result<Option<VerificationToken>, AppError>;
    async fn delete(&self, token: &str) -> Result<(), AppError>;
}

/// Outcome of a login attempt. Always returned with HTTP-level detail kept
/// deliberately coarse; the `message` is safe to show to the caller.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
    pub is_locked: bool,
    pub remaining_attempts: u32,
    pub requires_email_verification: bool,
    pub password_change_required: bool,
    pub password_expiry_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_until_password_expiry: Option<i64>,
}

impl LoginResult {
    fn failure(message: impl Into<String>, remaining_attempts: u32) -> Self {
        Self {
            success: false,
            message: message.into(),
            token: None,
            user: None,
            is_locked: false,
            remaining_attempts,
            requires_email_verification: false,
            password_change_required: false,
            password_expiry_warning: false,
            days_until_password_expiry: None,
        }
    }
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn VerificationTokenStore>,
    lockout: LockoutService,
    expiry: PasswordExpiryService,
    policy: PasswordPolicyService,
    audit: AuditService,
    mailer: Arc<dyn VerificationMailer>,
    jwt: Arc<JwtService>,
    min_login_duration: std::time::Duration,
    dummy_hash: PasswordHashString,
}

impl AuthService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn VerificationTokenStore>,
        lockout: LockoutService,
        expiry: PasswordExpiryService,
        policy: PasswordPolicyService,
        audit: AuditService,
        mailer: Arc<dyn VerificationMailer>,
        jwt: Arc<JwtService>,
        min_login_duration: std::time::Duration,
        dummy_hash: PasswordHashString,
    ) -> Self {
        Self {
            users,
            tokens,
            lockout,
            expiry,
            policy,
            audit,
            mailer,
            jwt,
            min_login_duration,
            dummy_hash,
        }
    }

    /// Handle a login attempt. Never returns an error: internal failures
    /// collapse to a generic message so the response shape and timing stay
    /// uniform.
    pub async fn login(
        &self,
        request: &LoginRequest,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> LoginResult {
        let started = Instant::now();

        let result = match self.login_guarded(request, ip, user_agent).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Login attempt failed internally");
                LoginResult::failure(MSG_LOGIN_ERROR, 0)
            }
        };

        self.pad_to_floor(started).await;
        result
    }

    async fn login_guarded(
        &self,
        request: &LoginRequest,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<LoginResult, AppError> {
        let email = request.email.trim().to_lowercase();
        let password = Password::new(request.password.clone());

        // Locked accounts do no credential work at all.
        let status = self.lockout.check(&email).await?;
        if status.is_locked {
            let message = status.lock_message(chrono::Utc::now());
            self.audit
                .log_attempt(LoginAudit::failure(&email, None, "locked", ip, user_agent))
                .await;
            let mut result = LoginResult::failure(message, 0);
            result.is_locked = true;
            return Ok(result);
        }

        let user = self.users.find_by_email(&email).await?;

        // Verification always runs. The dummy hash keeps the unknown-email
        // path doing the same argon2 work as a real mismatch.
        let password_ok = match &user {
            Some(user) => verify_password(
                &password,
                &PasswordHashString::new(user.password_hash.clone()),
            ),
            None => {
                let _ = verify_password(&password, &self.dummy_hash);
                false
            }
        };

        if !password_ok {
            let status = self.lockout.record_failure(&email, ip, user_agent).await?;
            self.audit
                .log_attempt(LoginAudit::failure(
                    &email,
                    user.as_ref(),
                    "invalid_credentials",
                    ip,
                    user_agent,
                ))
                .await;
            let mut result = LoginResult::failure(MSG_INVALID_CREDENTIALS, status.remaining_attempts);
            result.is_locked = status.is_locked;
            return Ok(result);
        }

        let user = match user {
            Some(user) => user,
            // Unreachable: password_ok is always false without a user.
            None => return Ok(LoginResult::failure(MSG_INVALID_CREDENTIALS, 0)),
        };

        // Correct password but unverified email: no counter increment, the
        // caller proved they own the credentials.
        if !user.email_verified {
            self.audit
                .log_attempt(LoginAudit::failure(
                    &email,
                    Some(&user),
                    "email_unverified",
                    ip,
                    user_agent,
                ))
                .await;
            let mut result = LoginResult::failure(MSG_EMAIL_UNVERIFIED, 0);
            result.requires_email_verification = true;
            return Ok(result);
        }

        if !user.is_active() {
            self.audit
                .log_attempt(LoginAudit::failure(
                    &email,
                    Some(&user),
                    "account_inactive",
                    ip,
                    user_agent,
                ))
                .await;
            return Ok(LoginResult::failure(MSG_ACCOUNT_INACTIVE, 0));
        }

        self.lockout.clear(&email).await?;

        let requirement = self.expiry.check_change_required(user.user_id).await?;
        let warning = self.expiry.within_warning_window(&requirement);

        self.audit
            .log_attempt(LoginAudit::success(&user, ip, user_agent))
            .await;

        let token = self.jwt.issue_for_user(&user)?;

        let message = if requirement.change_required {
            MSG_PASSWORD_EXPIRED.to_string()
        } else if warning {
            format!(
                "Login successful. Your password will expire in {} days.",
                requirement.days_until_expiry
            )
        } else {
            MSG_LOGIN_OK.to_string()
        };

        Ok(LoginResult {
            success: true,
            message,
            token: Some(token),
            user: Some(user.sanitized()),
            is_locked: false,
            remaining_attempts: 0,
            requires_email_verification: false,
            password_change_required: requirement.change_required,
            password_expiry_warning: warning,
            days_until_password_expiry: Some(requirement.days_until_expiry),
        })
    }

    /// Sleep out the remainder of the minimum attempt duration.
    async fn pad_to_floor(&self, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed < self.min_login_duration {
            tokio::time::sleep(self.min_login_duration - elapsed).await;
        }
    }

    /// Register a new practitioner account and send a verification token.
    pub async fn register(
        &self,
        request: &RegisterRequest,
        ip: Option<&str>,
        user_agent: Option<&str>,
    ) -> Result<UserResponse, ServiceError> {
        let email = request.email.trim().to_lowercase();

        if self.policy.is_common_or_breached(&request.password).await {
            self.audit
                .log_attempt(LoginAudit::failure(
                    &email,
                    None,
                    "registration_weak_password",
                    ip,
                    user_agent,
                ))
                .await;
            return Err(ServiceError::WeakPassword(
                "This password is too common or has appeared in a known data breach. Please choose a different one.".to_string(),
            ));
        }

        if self.users.find_by_email(&email).await?.is_some() {
            self.audit
                .log_attempt(LoginAudit::failure(
                    &email,
                    None,
                    "registration_email_exists",
                    ip,
                    user_agent,
                ))
                .await;
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let password = Password::new(request.password.clone());
        let hash = hash_password(&password)?;

        let user = User::new(
            email.clone(),
            hash.as_str().to_string(),
            request.display_name.clone(),
            request.service_type_code.clone(),
            request.license_number.clone(),
            request.license_state.clone(),
        );
        self.users.insert(&user).await?;
        self.expiry.record_change(user.user_id, hash.as_str()).await?;

        let token = generate_random_token();
        let verification =
            VerificationToken::new(user.user_id, token.clone(), VERIFICATION_TOKEN_TTL_HOURS);
        self.tokens.insert(&verification).await?;

        if let Err(e) = self.mailer.send_verification(&email, &token).await {
            tracing::error!(error = %e, email = %email, "Failed to send verification email");
        }

        self.audit
            .log_attempt(LoginAudit::success(&user, ip, user_agent))
            .await;

        tracing::info!(user_id = %user.user_id, "Registered new account");
        Ok(user.sanitized())
    }

    /// Consume a verification token and activate the account.
    pub async fn verify_email(&self, token: &str) -> Result<(), ServiceError> {
        let verification = self
            .tokens
            .find(token)
            .await?
            .ok_or(ServiceError::InvalidToken)?;

        if verification.is_expired() {
            self.tokens.delete(token).await?;
            return Err(ServiceError::TokenExpired);
        }

        self.users.mark_email_verified(verification.user_id).await?;
        self.tokens.delete(token).await?;

        tracing::info!(user_id = %verification.user_id, "Email verified");
        Ok(())
    }

    /// Change an authenticated user's password, enforcing policy and the
    /// reuse window.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: &ChangePasswordRequest,
    ) -> Result<(), ServiceError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let current = Password::new(request.current_password.clone());
        if !verify_password(
            &current,
            &PasswordHashString::new(user.password_hash.clone()),
        ) {
            return Err(ServiceError::InvalidCredentials);
        }

        if self.policy.is_common_or_breached(&request.new_password).await {
            return Err(ServiceError::WeakPassword(
                "This password is too common or has appeared in a known data breach. Please choose a different one.".to_string(),
            ));
        }

        let new_password = Password::new(request.new_password.clone());
        if verify_password(
            &new_password,
            &PasswordHashString::new(user.password_hash.clone()),
        ) || self.expiry.is_password_reused(user_id, &new_password).await?
        {
            return Err(ServiceError::PasswordReused);
        }

        let new_hash = hash_password(&new_password)?;
        self.users
            .update_password_hash(user_id, new_hash.as_str())
            .await?;
        self.expiry.record_change(user_id, new_hash.as_str()).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}

/// 256-bit random token, hex encoded.
pub fn generate_random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
