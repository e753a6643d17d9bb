//! Scenario tests for the login/refresh/logout flows over the in-memory
//! cache backend.

use async_trait::async_trait;
use authgate_common::{AuthError, MemoryCache};
use authgate_token::{AuthFlow, CredentialVerifier, Subject, TokenConfig};
use std::collections::HashMap;
use std::sync::Arc;

const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

/// Fixed-table credential verifier standing in for persistence.
struct TableVerifier {
    accounts: HashMap<String, (i64, String)>,
}

impl TableVerifier {
    fn with_alice() -> Self {
        let mut accounts = HashMap::new();
        accounts.insert("alice".to_string(), (42, "correct horse".to_string()));
        Self { accounts }
    }
}

#[async_trait]
impl CredentialVerifier for TableVerifier {
    async fn verify(&self, principal: &str, secret: &str) -> Result<Option<Subject>, AuthError> {
        Ok(self.accounts.get(principal).and_then(|(id, expected)| {
            (expected.as_str() == secret).then(|| Subject {
                id: *id,
                principal: principal.to_string(),
            })
        }))
    }
}

fn flow() -> AuthFlow {
    AuthFlow::new(
        &TokenConfig::for_tests(SECRET),
        Arc::new(MemoryCache::new()),
        Arc::new(TableVerifier::with_alice()),
    )
}

#[tokio::test]
async fn login_issues_a_working_pair() {
    let flow = flow();

    let pair = flow.login("alice", "correct horse").await.unwrap();
    assert_eq!(pair.access.claims.sub, 42);
    assert_eq!(pair.access.claims.principal, "alice");
    assert_ne!(pair.access.jti(), pair.refresh.jti());

    // The refresh token registered at login rotates successfully.
    flow.refresh(&pair.refresh.token).await.unwrap();
}

#[tokio::test]
async fn rotated_refresh_token_is_single_use() {
    let flow = flow();
    let pair = flow.login("alice", "correct horse").await.unwrap();

    let next = flow.refresh(&pair.refresh.token).await.unwrap();

    // Reusing the rotated-away token fails before its natural expiry.
    let err = flow.refresh(&pair.refresh.token).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));

    // The replacement remains valid.
    flow.refresh(&next.refresh.token).await.unwrap();
}

#[tokio::test]
async fn logout_severs_both_tokens() {
    let flow = flow();
    let pair = flow.login("alice", "correct horse").await.unwrap();

    flow.logout("alice", pair.access.jti(), pair.access.expires_at_millis())
        .await
        .unwrap();

    // The refresh session is gone, so rotation fails.
    let err = flow.refresh(&pair.refresh.token).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));
}

#[tokio::test]
async fn relogin_displaces_previous_session() {
    let flow = flow();

    let first = flow.login("alice", "correct horse").await.unwrap();
    let second = flow.login("alice", "correct horse").await.unwrap();

    // Only the newest refresh token is registered.
    let err = flow.refresh(&first.refresh.token).await.unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));
    flow.refresh(&second.refresh.token).await.unwrap();
}

#[tokio::test]
async fn bad_credentials_feed_the_attempt_guard() {
    let flow = flow();

    for _ in 0..4 {
        let err = flow.login("alice", "wrong").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert!(!flow.attempts().is_locked("alice").await.unwrap());
    }

    // Fifth consecutive failure locks the account.
    flow.login("alice", "wrong").await.unwrap_err();
    assert!(flow.attempts().is_locked("alice").await.unwrap());

    // A sixth attempt is rejected before credentials are even checked,
    // with the remaining lock duration close to the configured 1800s.
    let err = flow.login("alice", "correct horse").await.unwrap_err();
    match err {
        AuthError::AccountLocked { retry_after } => {
            assert!(retry_after.as_secs() > 1790 && retry_after.as_secs() <= 1800);
        }
        other => panic!("expected AccountLocked, got {other:?}"),
    }
}

#[tokio::test]
async fn success_before_threshold_resets_counter() {
    let flow = flow();

    for _ in 0..3 {
        flow.login("alice", "wrong").await.unwrap_err();
    }

    // Success on the fourth attempt resets the counter; the account
    // never locks.
    flow.login("alice", "correct horse").await.unwrap();

    for _ in 0..4 {
        flow.login("alice", "wrong").await.unwrap_err();
    }
    assert!(!flow.attempts().is_locked("alice").await.unwrap());
}

#[tokio::test]
async fn unknown_principal_is_invalid_credentials() {
    let flow = flow();
    let err = flow.login("mallory", "whatever").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}
