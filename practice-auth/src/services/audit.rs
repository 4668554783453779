//! Login audit trail.
//!
//! Audit writes are best effort: a failed insert is logged and swallowed so
//! an audit-store outage never changes the login outcome or its timing.

use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;

use crate::models::LoginAudit;

#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn insert_login_audit(&self, audit: &LoginAudit) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct AuditService {
    store: Arc<dyn AuditStore>,
}

impl AuditService {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub async fn log_attempt(&self, audit: LoginAudit) {
        if let Err(e) = self.store.insert_login_audit(&audit).await {
            tracing::error!(
                error = %e,
                email = %audit.email,
                success = audit.success,
                "Failed to write login audit record"
            );
        }
    }
}
