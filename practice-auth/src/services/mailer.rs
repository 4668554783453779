//! Verification mail delivery seam.

use async_trait::async_trait;

#[async_trait]
pub trait VerificationMailer: Send + Sync {
    async fn send_verification(&self, email: &str, token: &str) -> Result<(), anyhow::Error>;
}

/// Default mailer that logs the verification token instead of sending mail.
/// Used in development and test environments.
pub struct LoggingMailer;

#[async_trait]
impl VerificationMailer for LoggingMailer {
    async fn send_verification(&self, email: &str, token: &str) -> Result<(), anyhow::Error> {
        tracing::info!(email = %email, token = %token, "Verification email (logged, not sent)");
        Ok(())
    }
}
