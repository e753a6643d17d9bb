//! Edge service library.
//!
//! The edge validates bearer tokens once and then vouches for the
//! verified identity to downstream services with an asymmetric
//! per-request signature, so internal services trust the carried
//! identity fields without re-verifying the shared token secret.
//! Also provides the live-reloadable whitelist matcher and the
//! edge/downstream request guards.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod guard;
pub mod identity;
pub mod whitelist;

// Re-exports for convenience
pub use config::EdgeConfig;
pub use guard::{DownstreamGuard, EdgeDecision, EdgeGuard, RequestMeta};
pub use identity::{ForwardedIdentity, IdentitySigner, IdentityVerifier, SignedIdentity};
pub use whitelist::WhitelistMatcher;
