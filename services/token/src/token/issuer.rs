//! Token issuance.

use crate::config::TokenConfig;
use crate::token::claims::{TokenClaims, TokenType};
use authgate_common::AuthError;
use jsonwebtoken::{Algorithm, EncodingKey, Header};

/// A freshly issued token together with its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The signed, serialized token string.
    pub token: String,
    /// The claims that were signed into it.
    pub claims: TokenClaims,
}

impl IssuedToken {
    /// Unique token id.
    #[must_use]
    pub fn jti(&self) -> &str {
        &self.claims.jti
    }

    /// Expiry in unix milliseconds.
    #[must_use]
    pub const fn expires_at_millis(&self) -> i64 {
        self.claims.expires_at_millis()
    }
}

/// An access/refresh pair minted together at login or rotation.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Short-lived request credential.
    pub access: IssuedToken,
    /// Long-lived single-use rotation credential.
    pub refresh: IssuedToken,
}

/// Creates signed, self-contained access and refresh tokens.
pub struct TokenIssuer {
    issuer: String,
    encoding_key: EncodingKey,
    header: Header,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenIssuer {
    /// Build an issuer from the service configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            encoding_key: EncodingKey::from_secret(&config.signing_secret),
            header: Header::new(Algorithm::HS256),
            access_ttl_seconds: config.access_token_ttl.as_secs() as i64,
            refresh_ttl_seconds: config.refresh_token_ttl.as_secs() as i64,
        }
    }

    /// Issue a token of the given type for the subject.
    ///
    /// Generates a fresh unique id and signs `iat = now`,
    /// `exp = now + ttl(type)`.
    ///
    /// # Errors
    ///
    /// Returns an error only if JWT encoding itself fails.
    pub fn issue(
        &self,
        subject_id: i64,
        principal: &str,
        token_type: TokenType,
    ) -> Result<IssuedToken, AuthError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl_seconds,
            TokenType::Refresh => self.refresh_ttl_seconds,
        };
        let claims = TokenClaims::new(
            self.issuer.clone(),
            subject_id,
            principal.to_string(),
            token_type,
            ttl,
        );
        let token = self.encode(&claims)?;
        Ok(IssuedToken { token, claims })
    }

    /// Issue a matched access/refresh pair.
    ///
    /// # Errors
    ///
    /// Returns an error only if JWT encoding fails.
    pub fn issue_pair(&self, subject_id: i64, principal: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(subject_id, principal, TokenType::Access)?,
            refresh: self.issue(subject_id, principal, TokenType::Refresh)?,
        })
    }

    /// Sign arbitrary claims with this issuer's key.
    ///
    /// Used by tests to craft tokens (for example already-expired ones)
    /// that verify against the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails.
    pub fn encode(&self, claims: &TokenClaims) -> Result<String, AuthError> {
        jsonwebtoken::encode(&self.header, claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("JWT encoding failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_issuer() -> TokenIssuer {
        TokenIssuer::new(&TokenConfig::for_tests(
            b"0123456789abcdef0123456789abcdef",
        ))
    }

    #[test]
    fn test_issue_access_token() {
        let issued = test_issuer().issue(7, "alice", TokenType::Access).unwrap();

        assert!(!issued.token.is_empty());
        assert_eq!(issued.claims.sub, 7);
        assert_eq!(issued.claims.principal, "alice");
        assert_eq!(issued.claims.token_type, TokenType::Access);
        assert_eq!(issued.claims.exp - issued.claims.iat, 1800);
    }

    #[test]
    fn test_refresh_outlives_access() {
        let pair = test_issuer().issue_pair(7, "alice").unwrap();
        assert!(pair.refresh.claims.exp > pair.access.claims.exp);
        assert_ne!(pair.access.jti(), pair.refresh.jti());
    }

    #[test]
    fn test_expiry_millis() {
        let issued = test_issuer().issue(7, "alice", TokenType::Access).unwrap();
        assert_eq!(issued.expires_at_millis(), issued.claims.exp * 1000);
    }
}
