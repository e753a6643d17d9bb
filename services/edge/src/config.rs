//! Centralized configuration for the edge service.

use authgate_common::AuthError;
use base64::Engine;
use std::env;
use std::time::Duration;

/// Edge service configuration.
#[derive(Debug, Clone)]
pub struct EdgeConfig {
    /// PKCS#8 identity signing key (edge instances only).
    pub signing_key: Option<Vec<u8>>,
    /// Identity public key (all instances).
    pub public_key: Vec<u8>,
    /// Maximum allowed clock difference between a signed identity's
    /// timestamp and verification time.
    pub skew_window: Duration,
    /// Initial whitelist pattern list.
    pub whitelist_patterns: Vec<String>,
    /// Redis URL for the shared cache cluster.
    pub redis_url: String,
}

impl EdgeConfig {
    /// Load configuration from environment variables.
    ///
    /// `IDENTITY_PUBLIC_KEY` is required; `IDENTITY_SIGNING_KEY` only on
    /// edge instances. Both are base64. `IDENTITY_SKEW_WINDOW_MS`
    /// defaults to 60000 and `AUTH_WHITELIST` is a comma-separated
    /// pattern list.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let signing_key = match env::var("IDENTITY_SIGNING_KEY") {
            Ok(encoded) => Some(decode_key("IDENTITY_SIGNING_KEY", &encoded)?),
            Err(_) => None,
        };
        let public_key = match env::var("IDENTITY_PUBLIC_KEY") {
            Ok(encoded) => decode_key("IDENTITY_PUBLIC_KEY", &encoded)?,
            Err(_) => return Err(AuthError::config("IDENTITY_PUBLIC_KEY is required")),
        };

        let skew_ms: u64 = match env::var("IDENTITY_SKEW_WINDOW_MS") {
            Ok(val) => val
                .parse()
                .map_err(|e| AuthError::config(format!("Invalid IDENTITY_SKEW_WINDOW_MS: {e}")))?,
            Err(_) => 60_000,
        };

        let whitelist_patterns = env::var("AUTH_WHITELIST")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        Ok(Self {
            signing_key,
            public_key,
            skew_window: Duration::from_millis(skew_ms),
            whitelist_patterns,
            redis_url,
        })
    }
}

fn decode_key(name: &str, encoded: &str) -> Result<Vec<u8>, AuthError> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| AuthError::config(format!("Invalid {name}: {e}")))
}
