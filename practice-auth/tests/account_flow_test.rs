//! Registration, email verification, and password change flows.

mod common;

use chrono::{Duration, Utc};
use common::{add_active_user, build_harness, login_request, HarnessOptions};
use practice_auth::dtos::auth::{ChangePasswordRequest, RegisterRequest};
use practice_auth::models::VerificationToken;
use practice_auth::services::ServiceError;

fn register_request(email: &str, password: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        password: password.to_string(),
        display_name: Some("Sam Okafor".to_string()),
        service_type_code: "ot".to_string(),
        license_number: Some("OT-20417".to_string()),
        license_state: Some("OR".to_string()),
    }
}

#[tokio::test]
async fn register_verify_then_login_round_trip() {
    let harness = build_harness(HarnessOptions::default());

    let user = harness
        .service
        .register(&register_request("sam@example.com", "a-long-novel-passphrase"), None, None)
        .await
        .expect("registration");

    assert_eq!(user.email, "sam@example.com");
    assert_eq!(user.status_code, "pending");
    assert!(!user.email_verified);

    // Fresh accounts cannot log in until verified.
    let blocked = harness
        .service
        .login(&login_request("sam@example.com", "a-long-novel-passphrase"), None, None)
        .await;
    assert!(!blocked.success);
    assert!(blocked.requires_email_verification);

    let sent = harness.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "sam@example.com");
    let token = sent[0].1.clone();

    harness.service.verify_email(&token).await.expect("verify");

    let result = harness
        .service
        .login(&login_request("sam@example.com", "a-long-novel-passphrase"), None, None)
        .await;
    assert!(result.success);
    assert!(result.token.is_some());
}

#[tokio::test]
async fn register_normalizes_email_and_rejects_duplicates() {
    let harness = build_harness(HarnessOptions::default());

    harness
        .service
        .register(&register_request("Sam@Example.com", "a-long-novel-passphrase"), None, None)
        .await
        .expect("first registration");

    let err = harness
        .service
        .register(&register_request("sam@example.COM", "other-long-passphrase-2"), None, None)
        .await
        .expect_err("duplicate email");
    assert!(matches!(err, ServiceError::EmailAlreadyRegistered));
}

#[tokio::test]
async fn register_rejects_common_password() {
    let harness = build_harness(HarnessOptions::default());

    let err = harness
        .service
        .register(&register_request("sam@example.com", "Password123"), None, None)
        .await
        .expect_err("common password");
    assert!(matches!(err, ServiceError::WeakPassword(_)));
}

#[tokio::test]
async fn verification_token_is_single_use_and_expires() {
    let harness = build_harness(HarnessOptions::default());

    harness
        .service
        .register(&register_request("sam@example.com", "a-long-novel-passphrase"), None, None)
        .await
        .expect("registration");
    let token = harness.mailer.sent.lock().unwrap()[0].1.clone();

    harness.service.verify_email(&token).await.expect("verify");
    let err = harness
        .service
        .verify_email(&token)
        .await
        .expect_err("second use");
    assert!(matches!(err, ServiceError::InvalidToken));

    // An expired token is rejected and removed.
    let user = add_active_user(&harness.stores, "old@example.com", "a-long-novel-passphrase");
    let expired = VerificationToken {
        token: "expired-token".to_string(),
        user_id: user.user_id,
        expiry_utc: Utc::now() - Duration::hours(1),
    };
    harness
        .stores
        .tokens
        .lock()
        .unwrap()
        .insert(expired.token.clone(), expired);

    let err = harness
        .service
        .verify_email("expired-token")
        .await
        .expect_err("expired token");
    assert!(matches!(err, ServiceError::TokenExpired));
    assert!(harness.stores.tokens.lock().unwrap().is_empty());
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let harness = build_harness(HarnessOptions::default());
    let user = add_active_user(&harness.stores, "dana@example.com", "a-long-novel-passphrase");

    let err = harness
        .service
        .change_password(
            user.user_id,
            &ChangePasswordRequest {
                current_password: "not-my-password".to_string(),
                new_password: "a-different-long-phrase".to_string(),
            },
        )
        .await
        .expect_err("wrong current password");
    assert!(matches!(err, ServiceError::InvalidCredentials));
}

#[tokio::test]
async fn change_password_rejects_reuse_within_history_window() {
    let harness = build_harness(HarnessOptions::default());
    let user = add_active_user(&harness.stores, "dana@example.com", "a-long-novel-passphrase");

    // Same as current.
    let err = harness
        .service
        .change_password(
            user.user_id,
            &ChangePasswordRequest {
                current_password: "a-long-novel-passphrase".to_string(),
                new_password: "a-long-novel-passphrase".to_string(),
            },
        )
        .await
        .expect_err("same as current");
    assert!(matches!(err, ServiceError::PasswordReused));

    // Change once, then try to change back.
    harness
        .service
        .change_password(
            user.user_id,
            &ChangePasswordRequest {
                current_password: "a-long-novel-passphrase".to_string(),
                new_password: "a-second-long-phrase-9".to_string(),
            },
        )
        .await
        .expect("first change");

    let err = harness
        .service
        .change_password(
            user.user_id,
            &ChangePasswordRequest {
                current_password: "a-second-long-phrase-9".to_string(),
                new_password: "a-long-novel-passphrase".to_string(),
            },
        )
        .await
        .expect_err("reuse of prior password");
    assert!(matches!(err, ServiceError::PasswordReused));
}

#[tokio::test]
async fn change_password_takes_effect_for_login() {
    let harness = build_harness(HarnessOptions::default());
    let user = add_active_user(&harness.stores, "dana@example.com", "a-long-novel-passphrase");

    harness
        .service
        .change_password(
            user.user_id,
            &ChangePasswordRequest {
                current_password: "a-long-novel-passphrase".to_string(),
                new_password: "a-second-long-phrase-9".to_string(),
            },
        )
        .await
        .expect("change");

    let old = harness
        .service
        .login(&login_request("dana@example.com", "a-long-novel-passphrase"), None, None)
        .await;
    assert!(!old.success);

    let new = harness
        .service
        .login(&login_request("dana@example.com", "a-second-long-phrase-9"), None, None)
        .await;
    assert!(new.success);
    // The change refreshed the expiry clock.
    assert_eq!(new.days_until_password_expiry, Some(90));
}
