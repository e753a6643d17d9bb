//! Single-use refresh rotation.
//!
//! The core state transition of the subsystem: a presented refresh token
//! is exchanged for a fresh access/refresh pair exactly once. The session
//! store's conditional swap makes concurrent duplicate rotations lose
//! cleanly instead of racing the revoke/store writes.

use crate::store::revocation::RevocationStore;
use crate::store::session::RefreshSessionStore;
use crate::token::claims::TokenType;
use crate::token::issuer::{TokenIssuer, TokenPair};
use crate::token::validator::TokenValidator;
use authgate_common::AuthError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Rotates refresh tokens, enforcing one active refresh id per principal.
pub struct RefreshRotator {
    issuer: Arc<TokenIssuer>,
    validator: Arc<TokenValidator>,
    sessions: Arc<RefreshSessionStore>,
    revocations: Arc<RevocationStore>,
    refresh_ttl: Duration,
}

impl RefreshRotator {
    /// Wire the rotator to its collaborators.
    #[must_use]
    pub fn new(
        issuer: Arc<TokenIssuer>,
        validator: Arc<TokenValidator>,
        sessions: Arc<RefreshSessionStore>,
        revocations: Arc<RevocationStore>,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            issuer,
            validator,
            sessions,
            revocations,
            refresh_ttl,
        }
    }

    /// Exchange a refresh token for a new access/refresh pair.
    ///
    /// A token that was already rotated away (or never registered) is
    /// treated as compromised or stale and rejected as expired, even
    /// though its own signature and expiry still hold.
    ///
    /// # Errors
    ///
    /// Any validation failure of the presented token, `TokenExpired` when
    /// the token is not the principal's current refresh id or loses a
    /// concurrent rotation, or a cache error.
    pub async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self
            .validator
            .parse_and_validate(refresh_token, Some(TokenType::Refresh))
            .await?;

        // Cheap pre-check; the conditional swap below is the real gate.
        if !self.sessions.is_current(&claims.principal, &claims.jti).await? {
            warn!(
                jti = %claims.jti,
                principal = %claims.principal,
                "Rejected superseded refresh token"
            );
            return Err(AuthError::TokenExpired);
        }

        let pair = self.issuer.issue_pair(claims.sub, &claims.principal)?;

        let swapped = self
            .sessions
            .replace_if_current(
                &claims.principal,
                &claims.jti,
                pair.refresh.jti(),
                self.refresh_ttl,
            )
            .await?;
        if !swapped {
            // A concurrent duplicate won the swap; the freshly issued pair
            // is dropped unregistered and becomes unusable for rotation.
            warn!(
                jti = %claims.jti,
                principal = %claims.principal,
                "Lost concurrent refresh rotation"
            );
            return Err(AuthError::TokenExpired);
        }

        // Blacklist the old id for its remaining lifetime.
        self.revocations
            .revoke(&claims.jti, claims.expires_at_millis())
            .await?;

        info!(
            principal = %claims.principal,
            old_jti = %claims.jti,
            new_jti = %pair.refresh.jti(),
            "Rotated refresh token"
        );
        Ok(pair)
    }
}
