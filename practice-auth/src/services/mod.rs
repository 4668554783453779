pub mod audit;
pub mod auth;
pub mod error;
pub mod jwt;
pub mod lockout;
pub mod mailer;
pub mod password_expiry;
pub mod password_policy;

pub use audit::{AuditService, AuditStore};
pub use auth::{AuthService, LoginResult, UserStore, VerificationTokenStore};
pub use error::ServiceError;
pub use jwt::{AccessTokenClaims, JwtService};
pub use lockout::{LockoutPolicy, LockoutService, LockoutStatus, LoginAttemptStore};
pub use mailer::{LoggingMailer, VerificationMailer};
pub use password_expiry::{
    ExpiryPolicy, PasswordChangeRequirement, PasswordExpiryService, PasswordHistoryStore,
};
pub use password_policy::{BreachClient, PasswordPolicyService, PwnedClient};
