//! Token parsing and validation.
//!
//! One validation algorithm with two call shapes: the async form for
//! event-loop callers, and a blocking wrapper for thread-per-request
//! callers. The checks run in a fixed order and the first failure wins:
//! signature, expiry, type, revocation.

use crate::config::TokenConfig;
use crate::store::revocation::RevocationStore;
use crate::token::claims::{TokenClaims, TokenType};
use authgate_common::AuthError;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use tracing::warn;

/// Parses and verifies access and refresh tokens.
pub struct TokenValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    revocations: Arc<RevocationStore>,
}

impl TokenValidator {
    /// Build a validator sharing the issuer's symmetric key.
    #[must_use]
    pub fn new(config: &TokenConfig, revocations: Arc<RevocationStore>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked explicitly below so the check order is fixed:
        // a bad signature must win over a past expiry.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        Self {
            decoding_key: DecodingKey::from_secret(&config.signing_secret),
            validation,
            revocations,
        }
    }

    /// Parse a serialized token and run the full check sequence.
    ///
    /// The type check only runs when `expected` is given. A revoked token
    /// reports as [`AuthError::TokenExpired`].
    ///
    /// # Errors
    ///
    /// `TokenInvalid` on malformed input or signature mismatch,
    /// `TokenExpired` on natural expiry or revocation,
    /// `TokenTypeMismatch` on the wrong token type, and `Cache` if the
    /// revocation lookup fails (validation fails closed).
    pub async fn parse_and_validate(
        &self,
        token: &str,
        expected: Option<TokenType>,
    ) -> Result<TokenClaims, AuthError> {
        let claims = self.parse(token)?;

        if claims.is_expired() {
            return Err(AuthError::TokenExpired);
        }

        if let Some(expected) = expected {
            if claims.token_type != expected {
                return Err(AuthError::TokenTypeMismatch {
                    expected: expected.as_str().to_string(),
                    actual: claims.token_type.as_str().to_string(),
                });
            }
        }

        if self.revocations.is_revoked(&claims.jti).await? {
            warn!(jti = %claims.jti, principal = %claims.principal, "Rejected revoked token");
            return Err(AuthError::TokenExpired);
        }

        Ok(claims)
    }

    /// Blocking form of [`parse_and_validate`](Self::parse_and_validate)
    /// for thread-per-request callers.
    ///
    /// Drives the same algorithm to completion on the given runtime
    /// handle. Must not be called from within an async context.
    ///
    /// # Errors
    ///
    /// Same as [`parse_and_validate`](Self::parse_and_validate).
    pub fn parse_and_validate_blocking(
        &self,
        handle: &tokio::runtime::Handle,
        token: &str,
        expected: Option<TokenType>,
    ) -> Result<TokenClaims, AuthError> {
        handle.block_on(self.parse_and_validate(token, expected))
    }

    /// Signature and structure check only (validation step 1).
    fn parse(&self, token: &str) -> Result<TokenClaims, AuthError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

/// Collapse jsonwebtoken's error kinds onto the caller-visible taxonomy.
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        // Expiry is checked explicitly, but map it anyway.
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    }
}
