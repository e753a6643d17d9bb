//! Edge and downstream request guards.
//!
//! Explicit guards composed in front of request handlers: the edge guard
//! validates the bearer token once and stamps a signed identity onto the
//! forwarded request; the downstream guard verifies that signature and
//! trusts the carried fields directly, with no second token or database
//! round-trip.

use crate::identity::headers::ForwardedIdentity;
use crate::identity::signer::IdentitySigner;
use crate::identity::verifier::IdentityVerifier;
use crate::whitelist::WhitelistMatcher;
use authgate_common::AuthError;
use authgate_token::token::{TokenType, TokenValidator};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Request metadata the edge observes and forwards alongside the
/// identity.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Client IP as seen at the edge.
    pub client_ip: String,
    /// Client user agent.
    pub user_agent: String,
    /// Login location label, when known.
    pub login_location: Option<String>,
}

/// Outcome of the edge pipeline for one inbound request.
#[derive(Debug, Clone)]
pub enum EdgeDecision {
    /// The path is whitelisted; no authentication required.
    Bypass,
    /// The bearer was validated; forward with these trust headers.
    Forward(ForwardedIdentity),
}

/// The edge-side guard: whitelist, token validation, identity stamping.
pub struct EdgeGuard {
    whitelist: Arc<WhitelistMatcher>,
    validator: Arc<TokenValidator>,
    signer: Arc<IdentitySigner>,
}

impl EdgeGuard {
    /// Wire the guard to its collaborators.
    #[must_use]
    pub fn new(
        whitelist: Arc<WhitelistMatcher>,
        validator: Arc<TokenValidator>,
        signer: Arc<IdentitySigner>,
    ) -> Self {
        Self {
            whitelist,
            validator,
            signer,
        }
    }

    /// Run the edge pipeline for one request.
    ///
    /// Whitelisted paths bypass authentication entirely. Otherwise the
    /// bearer token is validated as an access token (including the
    /// revocation lookup) and the verified identity is signed for
    /// downstream consumption. A failure at any step short-circuits the
    /// rest.
    ///
    /// # Errors
    ///
    /// `TokenMissing`/`TokenInvalid` on a missing or malformed
    /// `Authorization` header, any validation error, or an internal
    /// signing failure.
    pub async fn authorize(
        &self,
        path: &str,
        authorization: Option<&str>,
        meta: &RequestMeta,
    ) -> Result<EdgeDecision, AuthError> {
        if self.whitelist.is_whitelisted(path) {
            debug!(path = %path, "Whitelisted path, bypassing authentication");
            return Ok(EdgeDecision::Bypass);
        }

        let token = extract_bearer(authorization)?;
        let claims = self
            .validator
            .parse_and_validate(token, Some(TokenType::Access))
            .await?;

        let identity = self
            .signer
            .sign_now(claims.sub, &claims.principal, &claims.jti)?;

        Ok(EdgeDecision::Forward(ForwardedIdentity {
            identity,
            token_expires_at_millis: claims.expires_at_millis(),
            client_ip: meta.client_ip.clone(),
            user_agent: meta.user_agent.clone(),
            login_location: meta.login_location.clone(),
        }))
    }
}

/// Outcome of the downstream pipeline for one inbound request.
#[derive(Debug, Clone)]
pub enum DownstreamDecision {
    /// The path is whitelisted; no authentication required.
    Bypass,
    /// The edge signature verified; these fields are trusted as-is.
    Trusted(ForwardedIdentity),
}

/// The downstream-side guard: whitelist, then signature verification.
///
/// Verification is pure computation over the request headers, so the
/// guard is synchronous and fits thread-per-request services directly.
pub struct DownstreamGuard {
    whitelist: Arc<WhitelistMatcher>,
    verifier: IdentityVerifier,
}

impl DownstreamGuard {
    /// Wire the guard to its collaborators.
    #[must_use]
    pub fn new(whitelist: Arc<WhitelistMatcher>, verifier: IdentityVerifier) -> Self {
        Self {
            whitelist,
            verifier,
        }
    }

    /// Authenticate one inbound request from the trust headers.
    ///
    /// # Errors
    ///
    /// [`AuthError::SignatureInvalid`] on missing headers, a stale
    /// timestamp, or a cryptographic mismatch.
    pub fn authenticate(
        &self,
        path: &str,
        headers: &HashMap<String, String>,
    ) -> Result<DownstreamDecision, AuthError> {
        if self.whitelist.is_whitelisted(path) {
            debug!(path = %path, "Whitelisted path, bypassing authentication");
            return Ok(DownstreamDecision::Bypass);
        }

        let forwarded = ForwardedIdentity::from_header_map(headers)?;
        self.verifier.verify(&forwarded.identity)?;

        debug!(
            principal = %forwarded.identity.principal,
            token_id = %forwarded.identity.token_id,
            "Trusted forwarded identity"
        );
        Ok(DownstreamDecision::Trusted(forwarded))
    }
}

/// Pull the token out of an `Authorization: Bearer` header.
fn extract_bearer(authorization: Option<&str>) -> Result<&str, AuthError> {
    let header = authorization.ok_or(AuthError::TokenMissing)?;
    let token = header.strip_prefix("Bearer ").ok_or(AuthError::TokenInvalid)?;
    if token.is_empty() {
        return Err(AuthError::TokenMissing);
    }
    Ok(token)
}
