//! Centralized error taxonomy for the authgate services.
//!
//! Both services surface the same caller-visible failure codes, so the
//! taxonomy lives here rather than per service. All variants are terminal:
//! token validation is a stateless, idempotent check and retrying changes
//! nothing.

use std::time::Duration;
use thiserror::Error;

/// Caller-visible authentication error.
///
/// Revoked and rotation-superseded tokens are reported as `TokenExpired`;
/// from the caller's perspective they are indistinguishable from natural
/// expiry, which avoids leaking revocation state.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AuthError {
    /// No bearer token was present on the request.
    #[error("Token missing from request")]
    TokenMissing,

    /// Malformed token or symmetric signature mismatch.
    #[error("Token invalid")]
    TokenInvalid,

    /// Past natural expiry, revoked, or superseded by rotation.
    #[error("Token expired")]
    TokenExpired,

    /// An access token was presented where a refresh token was expected,
    /// or vice versa.
    #[error("Token type mismatch: expected {expected}, got {actual}")]
    TokenTypeMismatch {
        /// The token type the caller required.
        expected: String,
        /// The token type actually carried in the claims.
        actual: String,
    },

    /// Credential verification failed during login.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Login blocked by the attempt guard.
    #[error("Account locked")]
    AccountLocked {
        /// How long until the lock expires.
        retry_after: Duration,
    },

    /// Identity-signature verification failure: missing field, stale
    /// timestamp, or cryptographic mismatch.
    #[error("Identity signature invalid: {reason}")]
    SignatureInvalid {
        /// What was wrong with the signed identity.
        reason: String,
    },

    /// Cache backend failure. Validation fails closed on these.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration loading or validation failure.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (details never exposed to callers).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Create a cache error with the given message.
    #[must_use]
    pub fn cache(msg: impl Into<String>) -> Self {
        Self::Cache(msg.into())
    }

    /// Create a configuration error with the given message.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error with the given message.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Create an identity-signature error with the given reason.
    #[must_use]
    pub fn signature(reason: impl Into<String>) -> Self {
        Self::SignatureInvalid {
            reason: reason.into(),
        }
    }

    /// Stable error code for API responses and logs.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::TokenMissing => AUTH_TOKEN_MISSING,
            Self::TokenInvalid => AUTH_TOKEN_INVALID,
            Self::TokenExpired => AUTH_TOKEN_EXPIRED,
            Self::TokenTypeMismatch { .. } => AUTH_TOKEN_TYPE_MISMATCH,
            Self::InvalidCredentials => AUTH_INVALID_CREDENTIALS,
            Self::AccountLocked { .. } => AUTH_ACCOUNT_LOCKED,
            Self::SignatureInvalid { .. } => AUTH_SIGNATURE_INVALID,
            Self::Cache(_) => AUTH_CACHE_ERROR,
            Self::Config(_) => AUTH_CONFIG_ERROR,
            Self::Internal(_) => AUTH_INTERNAL_ERROR,
        }
    }

    /// Remaining lock duration, when the error carries one.
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::AccountLocked { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Whether the error maps to an unauthorized response (as opposed to
    /// an infrastructure failure).
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::TokenMissing
                | Self::TokenInvalid
                | Self::TokenExpired
                | Self::TokenTypeMismatch { .. }
                | Self::InvalidCredentials
                | Self::SignatureInvalid { .. }
        )
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(err: redis::RedisError) -> Self {
        AuthError::Cache(err.to_string())
    }
}

/// Error code: bearer token missing.
pub const AUTH_TOKEN_MISSING: &str = "AUTH_TOKEN_MISSING";
/// Error code: malformed token or bad symmetric signature.
pub const AUTH_TOKEN_INVALID: &str = "AUTH_TOKEN_INVALID";
/// Error code: expired, revoked, or rotation-superseded token.
pub const AUTH_TOKEN_EXPIRED: &str = "AUTH_TOKEN_EXPIRED";
/// Error code: wrong token type for the operation.
pub const AUTH_TOKEN_TYPE_MISMATCH: &str = "AUTH_TOKEN_TYPE_MISMATCH";
/// Error code: credential verification failed.
pub const AUTH_INVALID_CREDENTIALS: &str = "AUTH_INVALID_CREDENTIALS";
/// Error code: login blocked by the attempt guard.
pub const AUTH_ACCOUNT_LOCKED: &str = "AUTH_ACCOUNT_LOCKED";
/// Error code: identity signature rejected.
pub const AUTH_SIGNATURE_INVALID: &str = "AUTH_SIGNATURE_INVALID";
/// Error code: cache backend failure.
pub const AUTH_CACHE_ERROR: &str = "AUTH_CACHE_ERROR";
/// Error code: configuration failure.
pub const AUTH_CONFIG_ERROR: &str = "AUTH_CONFIG_ERROR";
/// Error code: internal failure.
pub const AUTH_INTERNAL_ERROR: &str = "AUTH_INTERNAL_ERROR";
