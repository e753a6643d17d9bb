//! Login, refresh and logout flows.
//!
//! Credential storage is an external collaborator; the flow only
//! orchestrates the attempt guard, the issuer and the session stores
//! around an injected [`CredentialVerifier`].

use crate::config::TokenConfig;
use crate::refresh::rotator::RefreshRotator;
use crate::store::attempts::LoginAttemptGuard;
use crate::store::revocation::RevocationStore;
use crate::store::session::RefreshSessionStore;
use crate::token::issuer::{TokenIssuer, TokenPair};
use crate::token::validator::TokenValidator;
use authgate_common::{AuthError, CacheStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// A verified account identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    /// Numeric subject id.
    pub id: i64,
    /// Login principal.
    pub principal: String,
}

/// Verifies login credentials against external persistence.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Verify `secret` for `principal`. `Ok(None)` means the credentials
    /// are wrong; errors are infrastructure failures.
    async fn verify(&self, principal: &str, secret: &str) -> Result<Option<Subject>, AuthError>;
}

/// The authentication flow: login, refresh, logout.
pub struct AuthFlow {
    issuer: Arc<TokenIssuer>,
    sessions: Arc<RefreshSessionStore>,
    revocations: Arc<RevocationStore>,
    attempts: LoginAttemptGuard,
    rotator: RefreshRotator,
    credentials: Arc<dyn CredentialVerifier>,
    refresh_ttl: std::time::Duration,
}

impl AuthFlow {
    /// Wire the full flow over a shared cache and a credential verifier.
    #[must_use]
    pub fn new(
        config: &TokenConfig,
        cache: Arc<dyn CacheStore>,
        credentials: Arc<dyn CredentialVerifier>,
    ) -> Self {
        let issuer = Arc::new(TokenIssuer::new(config));
        let revocations = Arc::new(RevocationStore::new(Arc::clone(&cache)));
        let sessions = Arc::new(RefreshSessionStore::new(Arc::clone(&cache)));
        let validator = Arc::new(TokenValidator::new(config, Arc::clone(&revocations)));
        let attempts = LoginAttemptGuard::new(
            cache,
            config.attempt_threshold,
            config.attempt_window,
            config.lock_duration,
        );
        let rotator = RefreshRotator::new(
            Arc::clone(&issuer),
            validator,
            Arc::clone(&sessions),
            Arc::clone(&revocations),
            config.refresh_token_ttl,
        );

        Self {
            issuer,
            sessions,
            revocations,
            attempts,
            rotator,
            credentials,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    /// Authenticate a principal and mint its first token pair.
    ///
    /// The lock check runs before credential verification, so a locked
    /// account never reaches the verifier. A failed verification feeds
    /// the attempt guard; a successful one resets it and registers the
    /// refresh session (displacing any previous session).
    ///
    /// # Errors
    ///
    /// `AccountLocked`, `InvalidCredentials`, or a cache error.
    pub async fn login(&self, principal: &str, secret: &str) -> Result<TokenPair, AuthError> {
        self.attempts.ensure_not_locked(principal).await?;

        let subject = match self.credentials.verify(principal, secret).await? {
            Some(subject) => subject,
            None => {
                self.attempts.on_failure(principal).await?;
                return Err(AuthError::InvalidCredentials);
            }
        };
        self.attempts.on_success(principal).await?;

        let pair = self.issuer.issue_pair(subject.id, &subject.principal)?;
        self.sessions
            .store(&subject.principal, pair.refresh.jti(), self.refresh_ttl)
            .await?;

        info!(
            principal = %subject.principal,
            subject_id = subject.id,
            access_jti = %pair.access.jti(),
            "Login succeeded"
        );
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair (single-use rotation).
    ///
    /// # Errors
    ///
    /// See [`RefreshRotator::rotate`].
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.rotator.rotate(refresh_token).await
    }

    /// End the principal's session.
    ///
    /// Blacklists the transmitted access token id for its remaining
    /// lifetime and removes the active refresh session, so a later
    /// refresh with the still-signed refresh token fails.
    ///
    /// # Errors
    ///
    /// Returns an error if a cache operation fails.
    pub async fn logout(
        &self,
        principal: &str,
        access_jti: &str,
        access_expires_at_millis: i64,
    ) -> Result<(), AuthError> {
        self.revocations
            .revoke(access_jti, access_expires_at_millis)
            .await?;
        self.sessions.remove(principal).await?;

        info!(principal = %principal, access_jti = %access_jti, "Logout completed");
        Ok(())
    }

    /// The guard, exposed for lock status queries.
    #[must_use]
    pub const fn attempts(&self) -> &LoginAttemptGuard {
        &self.attempts
    }
}
