//! PostgreSQL persistence.
//!
//! One `Database` wrapper over a `PgPool` implements every store trait the
//! services depend on, so tests can swap in-memory implementations without
//! touching the service layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::models::{FailureRecord, LoginAudit, PasswordHistoryEntry, User, VerificationToken};
use crate::services::audit::AuditStore;
use crate::services::auth::{UserStore, VerificationTokenStore};
use crate::services::lockout::LoginAttemptStore;
use crate::services::password_expiry::PasswordHistoryStore;

/// PostgreSQL database wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect a pool using the configured URL and size.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to connect to database: {}", e))
            })?;

        Ok(Self { pool })
    }

    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Health check - ping the database.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Database health check failed: {}", e);
                AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
            })?;
        Ok(())
    }

    /// Create the schema if it does not exist yet.
    pub async fn initialize_schema(&self) -> Result<(), AppError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id UUID PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                display_name TEXT,
                service_type_code TEXT NOT NULL,
                license_number TEXT,
                license_state TEXT,
                status_code TEXT NOT NULL,
                email_verified BOOLEAN NOT NULL DEFAULT FALSE,
                created_utc TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS login_failures (
                email TEXT PRIMARY KEY,
                failure_count INTEGER NOT NULL,
                last_failure_utc TIMESTAMPTZ NOT NULL,
                last_ip TEXT,
                last_user_agent TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS login_audits (
                audit_id UUID PRIMARY KEY,
                email TEXT NOT NULL,
                license_number TEXT,
                license_state TEXT,
                success BOOLEAN NOT NULL,
                failure_reason TEXT,
                ip TEXT,
                user_agent TEXT,
                created_utc TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS password_history (
                entry_id UUID PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
                password_hash TEXT NOT NULL,
                changed_utc TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS verification_tokens (
                token TEXT PRIMARY KEY,
                user_id UUID NOT NULL REFERENCES users(user_id) ON DELETE CASCADE,
                expiry_utc TIMESTAMPTZ NOT NULL
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_login_audits_email ON login_audits (email, created_utc)",
            "CREATE INDEX IF NOT EXISTS idx_password_history_user ON password_history (user_id, changed_utc DESC)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        }

        Ok(())
    }
}

#[async_trait]
impl UserStore for Database {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO users (user_id, email, password_hash, display_name, service_type_code,
                               license_number, license_state, status_code, email_verified, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(&user.service_type_code)
        .bind(&user.license_number)
        .bind(&user.license_state)
        .bind(&user.status_code)
        .bind(user.email_verified)
        .bind(user.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE users
            SET email_verified = TRUE,
                status_code = CASE WHEN status_code = 'pending' THEN 'active' ELSE status_code END
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn update_password_hash(&self, user_id: Uuid, hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE user_id = $1")
            .bind(user_id)
            .bind(hash)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }
}

#[async_trait]
impl LoginAttemptStore for Database {
    async fn record_failure(
        &self,
        email: &str,
        ip: Option<&str>,
        user_agent: Option<&str>,
        stale_before: DateTime<Utc>,
    ) -> Result<FailureRecord, AppError> {
        // Single atomic upsert: stale counters restart at 1, live counters
        // increment. Concurrent attempts serialize on the row.
        sqlx::query_as::<_, FailureRecord>(
            r#"
            INSERT INTO login_failures (email, failure_count, last_failure_utc, last_ip, last_user_agent)
            VALUES (LOWER($1), 1, NOW(), $2, $3)
            ON CONFLICT (email) DO UPDATE
            SET failure_count = CASE
                    WHEN login_failures.last_failure_utc <= $4 THEN 1
                    ELSE login_failures.failure_count + 1
                END,
                last_failure_utc = NOW(),
                last_ip = $2,
                last_user_agent = $3
            RETURNING failure_count, last_failure_utc
            "#,
        )
        .bind(email)
        .bind(ip)
        .bind(user_agent)
        .bind(stale_before)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn find_failures(&self, email: &str) -> Result<Option<FailureRecord>, AppError> {
        sqlx::query_as::<_, FailureRecord>(
            "SELECT failure_count, last_failure_utc FROM login_failures WHERE email = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn clear_failures(&self, email: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM login_failures WHERE email = LOWER($1)")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }
}

#[async_trait]
impl PasswordHistoryStore for Database {
    async fn append(&self, entry: &PasswordHistoryEntry) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO password_history (entry_id, user_id, password_hash, changed_utc)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(entry.entry_id)
        .bind(entry.user_id)
        .bind(&entry.password_hash)
        .bind(entry.changed_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn latest_change(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, AppError> {
        // MAX over an empty set yields a NULL row, not zero rows.
        sqlx::query_scalar::<_, Option<DateTime<Utc>>>(
            "SELECT MAX(changed_utc) FROM password_history WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn recent_hashes(&self, user_id: Uuid, limit: u32) -> Result<Vec<String>, AppError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT password_hash FROM password_history
            WHERE user_id = $1
            ORDER BY changed_utc DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }
}

#[async_trait]
impl AuditStore for Database {
    async fn insert_login_audit(&self, audit: &LoginAudit) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO login_audits (audit_id, email, license_number, license_state, success,
                                      failure_reason, ip, user_agent, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(audit.audit_id)
        .bind(&audit.email)
        .bind(&audit.license_number)
        .bind(&audit.license_state)
        .bind(audit.success)
        .bind(&audit.failure_reason)
        .bind(&audit.ip)
        .bind(&audit.user_agent)
        .bind(audit.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }
}

#[async_trait]
impl VerificationTokenStore for Database {
    async fn insert(&self, token: &VerificationToken) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO verification_tokens (token, user_id, expiry_utc) VALUES ($1, $2, $3)",
        )
        .bind(&token.token)
        .bind(token.user_id)
        .bind(token.expiry_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<VerificationToken>, AppError> {
        sqlx::query_as::<_, VerificationToken>(
            "SELECT * FROM verification_tokens WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM verification_tokens WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!(e)))?;
        Ok(())
    }
}
