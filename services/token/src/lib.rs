//! Token service library.
//!
//! Provides access/refresh token issuance and validation, revocation,
//! single-active-session refresh rotation, the login attempt guard, and
//! the login/refresh/logout flows built on them.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod config;
pub mod refresh;
pub mod store;
pub mod token;

// Re-exports for convenience
pub use auth::{AuthFlow, CredentialVerifier, Subject};
pub use config::TokenConfig;
pub use token::{IssuedToken, TokenClaims, TokenIssuer, TokenPair, TokenType, TokenValidator};
