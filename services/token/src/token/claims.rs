//! Token claims and token types.

use serde::{Deserialize, Serialize};

/// Whether a token authorizes requests or only mints new pairs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenType {
    /// Short-lived credential authorizing individual requests.
    Access,
    /// Long-lived credential used only to mint new access/refresh pairs;
    /// single-use under rotation.
    Refresh,
}

impl TokenType {
    /// Token type name as it appears in claims and error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "ACCESS",
            Self::Refresh => "REFRESH",
        }
    }
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by a self-contained token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Issuer.
    pub iss: String,
    /// Numeric subject id.
    pub sub: i64,
    /// Login principal (account name).
    pub principal: String,
    /// Access or refresh.
    pub token_type: TokenType,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds. Always greater than `iat` for issued tokens.
    pub exp: i64,
    /// Unique token id, used for revocation and session bookkeeping.
    pub jti: String,
}

impl TokenClaims {
    /// Build claims expiring `ttl_seconds` from now with a fresh unique id.
    #[must_use]
    pub fn new(
        issuer: String,
        subject_id: i64,
        principal: String,
        token_type: TokenType,
        ttl_seconds: i64,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            iss: issuer,
            sub: subject_id,
            principal,
            token_type,
            iat: now,
            exp: now + ttl_seconds,
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Whether the token is past its natural expiry.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.exp < chrono::Utc::now().timestamp()
    }

    /// Expiry in unix milliseconds, the unit the revocation store takes.
    #[must_use]
    pub const fn expires_at_millis(&self) -> i64 {
        self.exp * 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_creation() {
        let claims = TokenClaims::new(
            "test-issuer".to_string(),
            42,
            "alice".to_string(),
            TokenType::Access,
            900,
        );

        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.principal, "alice");
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(claims.exp > claims.iat);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_fresh_jti_per_issuance() {
        let a = TokenClaims::new("i".to_string(), 1, "p".to_string(), TokenType::Access, 60);
        let b = TokenClaims::new("i".to_string(), 1, "p".to_string(), TokenType::Access, 60);
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_negative_ttl_is_expired() {
        let claims = TokenClaims::new(
            "i".to_string(),
            1,
            "p".to_string(),
            TokenType::Refresh,
            -60,
        );
        assert!(claims.is_expired());
    }

    #[test]
    fn test_token_type_serialization() {
        assert_eq!(
            serde_json::to_string(&TokenType::Access).unwrap(),
            "\"ACCESS\""
        );
        assert_eq!(
            serde_json::to_string(&TokenType::Refresh).unwrap(),
            "\"REFRESH\""
        );
    }
}
