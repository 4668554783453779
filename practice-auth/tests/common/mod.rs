//! Shared test fixtures: in-memory store implementations and a service
//! builder so the auth flows can be exercised without a database.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use practice_auth::config::JwtConfig;
use practice_auth::models::{
    FailureRecord, LoginAudit, PasswordHistoryEntry, User, VerificationToken,
};
use practice_auth::services::audit::AuditStore;
use practice_auth::services::auth::{UserStore, VerificationTokenStore};
use practice_auth::services::lockout::LoginAttemptStore;
use practice_auth::services::password_expiry::PasswordHistoryStore;
use practice_auth::services::{
    AuditService, AuthService, ExpiryPolicy, JwtService, LockoutPolicy, LockoutService,
    PasswordExpiryService, PasswordPolicyService, VerificationMailer,
};
use practice_auth::utils::password::{hash_password, Password};
use service_core::error::AppError;

/// Every store trait backed by maps, with call counters so tests can assert
/// which paths ran.
#[derive(Default)]
pub struct MemoryStores {
    pub users: Mutex<HashMap<Uuid, User>>,
    pub failures: Mutex<HashMap<String, FailureRecord>>,
    pub history: Mutex<Vec<PasswordHistoryEntry>>,
    pub audits: Mutex<Vec<LoginAudit>>,
    pub tokens: Mutex<HashMap<String, VerificationToken>>,

    pub find_by_email_calls: AtomicUsize,
    pub record_failure_calls: AtomicUsize,
    pub clear_failures_calls: AtomicUsize,
    /// When set, every store call fails, for exercising the error path.
    pub fail_all: std::sync::atomic::AtomicBool,
}

impl MemoryStores {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn check_fail(&self) -> Result<(), AppError> {
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(AppError::DatabaseError(anyhow::anyhow!(
                "store failure injected by test"
            )));
        }
        Ok(())
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.user_id, user);
    }

    pub fn seed_failures(&self, email: &str, count: i32, last_failure: DateTime<Utc>) {
        self.failures.lock().unwrap().insert(
            email.to_lowercase(),
            FailureRecord {
                failure_count: count,
                last_failure_utc: last_failure,
            },
        );
    }

    pub fn seed_password_change(&self, user_id: Uuid, hash: &str, changed: DateTime<Utc>) {
        let mut entry = PasswordHistoryEntry::new(user_id, hash.to_string());
        entry.changed_utc = changed;
        self.history.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl UserStore for MemoryStores {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.check_fail()?;
        self.find_by_email_calls.fetch_add(1, Ordering::SeqCst);
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        self.check_fail()?;
        Ok(self.users.lock().unwrap().get(&user_id).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), AppError> {
        self.check_fail()?;
        self.users.lock().unwrap().insert(user.user_id, user.clone());
        Ok(())
    }

    async fn mark_email_verified(&self, user_id: Uuid) -> Result<(), AppError> {
        self.check_fail()?;
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            user.email_verified = true;
            if user.status_code == "pending" {
                user.status_code = "active".to_string();
            }
        }
        Ok(())
    }

    async fn update_password_hash(&self, user_id: Uuid, hash: &str) -> Result<(), AppError> {
        self.check_fail()?;
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&user_id) {
            user.password_hash = hash.to_string();
        }
        Ok(())
    }
}

#[async_trait]
impl LoginAttemptStore for MemoryStores {
    async fn record_failure(
        &self,
        email: &str,
        _ip: Option<&str>,
        _user_agent: Option<&str>,
        stale_before: DateTime<Utc>,
    ) -> Result<FailureRecord, AppError> {
        self.check_fail()?;
        self.record_failure_calls.fetch_add(1, Ordering::SeqCst);
        let mut failures = self.failures.lock().unwrap();
        let key = email.to_lowercase();
        let now = Utc::now();
        let count = match failures.get(&key) {
            Some(existing) if existing.last_failure_utc > stale_before => {
                existing.failure_count + 1
            }
            _ => 1,
        };
        let record = FailureRecord {
            failure_count: count,
            last_failure_utc: now,
        };
        failures.insert(key, record.clone());
        Ok(record)
    }

    async fn find_failures(&self, email: &str) -> Result<Option<FailureRecord>, AppError> {
        self.check_fail()?;
        Ok(self
            .failures
            .lock()
            .unwrap()
            .get(&email.to_lowercase())
            .cloned())
    }

    async fn clear_failures(&self, email: &str) -> Result<(), AppError> {
        self.check_fail()?;
        self.clear_failures_calls.fetch_add(1, Ordering::SeqCst);
        self.failures.lock().unwrap().remove(&email.to_lowercase());
        Ok(())
    }
}

#[async_trait]
impl PasswordHistoryStore for MemoryStores {
    async fn append(&self, entry: &PasswordHistoryEntry) -> Result<(), AppError> {
        self.check_fail()?;
        self.history.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn latest_change(&self, user_id: Uuid) -> Result<Option<DateTime<Utc>>, AppError> {
        self.check_fail()?;
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.changed_utc)
            .max())
    }

    async fn recent_hashes(&self, user_id: Uuid, limit: u32) -> Result<Vec<String>, AppError> {
        self.check_fail()?;
        let mut entries: Vec<_> = self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.changed_utc.cmp(&a.changed_utc));
        Ok(entries
            .into_iter()
            .take(limit as usize)
            .map(|e| e.password_hash)
            .collect())
    }
}

#[async_trait]
impl VerificationTokenStore for MemoryStores {
    async fn insert(&self, token: &VerificationToken) -> Result<(), AppError> {
        self.check_fail()?;
        self.tokens
            .lock()
            .unwrap()
            .insert(token.token.clone(), token.clone());
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<VerificationToken>, AppError> {
        self.check_fail()?;
        Ok(self.tokens.lock().unwrap().get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        self.check_fail()?;
        self.tokens.lock().unwrap().remove(token);
        Ok(())
    }
}

#[async_trait]
impl AuditStore for MemoryStores {
    async fn insert_login_audit(&self, audit: &LoginAudit) -> Result<(), AppError> {
        // Audit writes stay best-effort even when failure is injected; the
        // service must swallow this error.
        self.check_fail()?;
        self.audits.lock().unwrap().push(audit.clone());
        Ok(())
    }
}

/// Mailer that captures tokens instead of sending anything.
#[derive(Default)]
pub struct CapturingMailer {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl VerificationMailer for CapturingMailer {
    async fn send_verification(&self, email: &str, token: &str) -> Result<(), anyhow::Error> {
        self.sent
            .lock()
            .unwrap()
            .push((email.to_string(), token.to_string()));
        Ok(())
    }
}

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "integration-test-secret".to_string(),
        issuer: "practice-auth".to_string(),
        audience: "practice-api".to_string(),
        token_expiry_hours: 8,
    }
}

pub struct TestHarness {
    pub service: AuthService,
    pub stores: Arc<MemoryStores>,
    pub mailer: Arc<CapturingMailer>,
    pub jwt: Arc<JwtService>,
}

pub struct HarnessOptions {
    pub min_login_duration_ms: u64,
    pub max_failed_attempts: u32,
    pub lockout_duration_minutes: i64,
    pub password_expiry_days: i64,
    pub password_expiry_warning_days: i64,
    pub password_history_depth: u32,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            // Keep the timing floor negligible so the suite stays fast; the
            // dedicated timing test raises it.
            min_login_duration_ms: 0,
            max_failed_attempts: 5,
            lockout_duration_minutes: 15,
            password_expiry_days: 90,
            password_expiry_warning_days: 14,
            password_history_depth: 5,
        }
    }
}

pub fn build_harness(options: HarnessOptions) -> TestHarness {
    let stores = MemoryStores::new();
    let mailer = Arc::new(CapturingMailer::default());
    let jwt = Arc::new(JwtService::new(&test_jwt_config()).expect("jwt service"));

    let lockout = LockoutService::new(
        stores.clone(),
        LockoutPolicy {
            max_failed_attempts: options.max_failed_attempts,
            lockout_duration: chrono::Duration::minutes(options.lockout_duration_minutes),
        },
    );
    let expiry = PasswordExpiryService::new(
        stores.clone(),
        ExpiryPolicy {
            interval_days: options.password_expiry_days,
            warning_days: options.password_expiry_warning_days,
            history_depth: options.password_history_depth,
        },
    );
    let audit = AuditService::new(stores.clone());
    let policy = PasswordPolicyService::new(None);

    let dummy_hash = hash_password(&Password::new("dummy-timing-equalizer".to_string()))
        .expect("dummy hash");

    let service = AuthService::new(
        stores.clone(),
        stores.clone(),
        lockout,
        expiry,
        policy,
        audit,
        mailer.clone(),
        jwt.clone(),
        std::time::Duration::from_millis(options.min_login_duration_ms),
        dummy_hash,
    );

    TestHarness {
        service,
        stores,
        mailer,
        jwt,
    }
}

/// Insert an active, verified user with the given password. Also seeds a
/// password-history entry dated now so expiry checks read as fresh.
pub fn add_active_user(stores: &MemoryStores, email: &str, password: &str) -> User {
    let hash = hash_password(&Password::new(password.to_string())).expect("hash");
    let mut user = User::new(
        email.to_string(),
        hash.as_str().to_string(),
        Some("Test Practitioner".to_string()),
        "slp".to_string(),
        Some("SLP-10001".to_string()),
        Some("WA".to_string()),
    );
    user.email_verified = true;
    user.status_code = "active".to_string();
    stores.add_user(user.clone());
    stores.seed_password_change(user.user_id, hash.as_str(), Utc::now());
    user
}

pub fn login_request(email: &str, password: &str) -> practice_auth::dtos::auth::LoginRequest {
    practice_auth::dtos::auth::LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}
