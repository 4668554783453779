//! Common-password and breach-corpus screening.
//!
//! The breach lookup uses the k-anonymity range API: only the first five hex
//! characters of the SHA-1 digest leave the process, never the plaintext or
//! the full hash. Any transport or service failure fails open so a third-party
//! outage can never block login or registration.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use sha1::{Digest, Sha1};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::config::BreachConfig;

static COMMON_PASSWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "password", "password1", "password123", "passw0rd", "123456", "1234567", "12345678",
        "123456789", "1234567890", "qwerty", "qwerty123", "1q2w3e4r", "qazwsx", "zaq12wsx",
        "abc123", "111111", "654321", "iloveyou", "admin", "welcome", "welcome1", "monkey",
        "login", "letmein", "dragon", "baseball", "football", "starwars", "princess", "sunshine",
        "master", "shadow", "superman", "batman", "trustno1", "whatever", "freedom", "charlie",
        "michael", "hello123",
    ]
    .into_iter()
    .collect()
});

/// Transport seam for the breach-corpus range API.
#[async_trait]
pub trait BreachClient: Send + Sync {
    /// Fetch the newline-delimited `SUFFIX:count` body for a 5-hex-char prefix.
    async fn range(&self, prefix: &str) -> Result<String, anyhow::Error>;
}

/// HTTP client for a Pwned-Passwords-compatible range endpoint.
pub struct PwnedClient {
    http: reqwest::Client,
    base_url: String,
}

impl PwnedClient {
    pub fn new(config: &BreachConfig) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent("practice-auth/1.0")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build breach HTTP client: {}", e))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl BreachClient for PwnedClient {
    async fn range(&self, prefix: &str) -> Result<String, anyhow::Error> {
        let url = format!("{}/range/{}", self.base_url, prefix);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Password screening against the static denylist and the breach corpus.
#[derive(Clone)]
pub struct PasswordPolicyService {
    breach: Option<Arc<dyn BreachClient>>,
}

impl PasswordPolicyService {
    /// `breach` is `None` when no breach endpoint is configured; only the
    /// local denylist applies then.
    pub fn new(breach: Option<Arc<dyn BreachClient>>) -> Self {
        Self { breach }
    }

    /// Case-insensitive static denylist check.
    pub fn is_common(password: &str) -> bool {
        COMMON_PASSWORDS.contains(password.to_lowercase().as_str())
    }

    /// Denylist first, then the k-anonymity breach lookup. Fails open: a
    /// breach-service failure is logged and treated as "not breached".
    pub async fn is_common_or_breached(&self, password: &str) -> bool {
        if Self::is_common(password) {
            return true;
        }

        let Some(client) = &self.breach else {
            return false;
        };

        let digest = hex::encode(Sha1::digest(password.as_bytes())).to_uppercase();
        let (prefix, suffix) = digest.split_at(5);

        match client.range(prefix).await {
            Ok(body) => body.lines().any(|line| {
                line.split_once(':')
                    .map(|(line_suffix, _count)| line_suffix == suffix)
                    .unwrap_or(false)
            }),
            Err(e) => {
                tracing::warn!(error = %e, "Breach lookup failed, failing open");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denylist_is_case_insensitive() {
        assert!(PasswordPolicyService::is_common("password"));
        assert!(PasswordPolicyService::is_common("PaSsWoRd"));
        assert!(!PasswordPolicyService::is_common("sufficiently-odd-phrase-9"));
    }

    #[test]
    fn sha1_prefix_split_matches_range_api_shape() {
        // "password" SHA-1 = 5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8
        let digest = hex::encode(Sha1::digest(b"password")).to_uppercase();
        assert_eq!(digest, "5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8");
        let (prefix, suffix) = digest.split_at(5);
        assert_eq!(prefix, "5BAA6");
        assert_eq!(suffix, "1E4C9B93F3F0682250B6CF8331B7EE68FD8");
    }

    struct FixedRange(String);

    #[async_trait]
    impl BreachClient for FixedRange {
        async fn range(&self, _prefix: &str) -> Result<String, anyhow::Error> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn matching_suffix_reports_breached() {
        // "correct horse battery staple" SHA-1 =
        // ABF7AAD6438836DBE526AA231ABDE2D0EEF74D42; not on the denylist, so
        // this exercises the breach path alone.
        let body = "AD6438836DBE526AA231ABDE2D0EEF74D42:120\nAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA:1";
        let service = PasswordPolicyService::new(Some(Arc::new(FixedRange(body.to_string()))));

        assert!(service.is_common_or_breached("correct horse battery staple").await);
    }

    #[tokio::test]
    async fn unmatched_suffix_is_clean() {
        let service = PasswordPolicyService::new(Some(Arc::new(FixedRange(
            "0000000000000000000000000000000000A:2".to_string(),
        ))));
        assert!(!service.is_common_or_breached("quite-unique-phrase-42").await);
    }

    #[tokio::test]
    async fn no_client_checks_denylist_only() {
        let service = PasswordPolicyService::new(None);
        assert!(service.is_common_or_breached("letmein").await);
        assert!(!service.is_common_or_breached("quite-unique-phrase-42").await);
    }
}
