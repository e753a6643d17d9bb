//! Centralized configuration for the token service.
//!
//! All configuration is loaded from environment variables and validated
//! at startup.

use authgate_common::AuthError;
use base64::Engine;
use std::env;
use std::time::Duration;
use zeroize::Zeroizing;

/// Token service configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// JWT issuer claim.
    pub issuer: String,
    /// HMAC secret for the symmetric token signature.
    pub signing_secret: Zeroizing<Vec<u8>>,
    /// Access token TTL (short; minutes).
    pub access_token_ttl: Duration,
    /// Refresh token TTL (long; days).
    pub refresh_token_ttl: Duration,
    /// Consecutive login failures before the account locks.
    pub attempt_threshold: u32,
    /// Window over which login failures accumulate.
    pub attempt_window: Duration,
    /// How long a locked account stays locked.
    pub lock_duration: Duration,
    /// Redis URL for the shared cache cluster.
    pub redis_url: String,
}

impl TokenConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but invalid.
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let issuer = env::var("JWT_ISSUER").unwrap_or_else(|_| "authgate".to_string());
        let signing_secret = parse_signing_secret()?;
        let access_token_ttl = Duration::from_secs(parse_env("ACCESS_TOKEN_TTL", 1800)?);
        let refresh_token_ttl = Duration::from_secs(parse_env("REFRESH_TOKEN_TTL", 604_800)?);
        let attempt_threshold = parse_env("LOGIN_ATTEMPT_THRESHOLD", 5)?;
        let attempt_window = Duration::from_secs(parse_env("LOGIN_ATTEMPT_WINDOW", 86_400)?);
        let lock_duration = Duration::from_secs(parse_env("LOGIN_LOCK_DURATION", 1800)?);
        let redis_url =
            env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

        let config = Self {
            issuer,
            signing_secret,
            access_token_ttl,
            refresh_token_ttl,
            attempt_threshold,
            attempt_window,
            lock_duration,
            redis_url,
        };
        config.validate()?;
        Ok(config)
    }

    /// Construct a config for tests with the given secret and defaults
    /// otherwise.
    #[must_use]
    pub fn for_tests(secret: &[u8]) -> Self {
        Self {
            issuer: "authgate-test".to_string(),
            signing_secret: Zeroizing::new(secret.to_vec()),
            access_token_ttl: Duration::from_secs(1800),
            refresh_token_ttl: Duration::from_secs(604_800),
            attempt_threshold: 5,
            attempt_window: Duration::from_secs(86_400),
            lock_duration: Duration::from_secs(1800),
            redis_url: "redis://127.0.0.1:6379".to_string(),
        }
    }

    fn validate(&self) -> Result<(), AuthError> {
        if self.signing_secret.len() < 32 {
            return Err(AuthError::config(
                "signing secret must be at least 32 bytes",
            ));
        }
        if self.access_token_ttl >= self.refresh_token_ttl {
            return Err(AuthError::config(
                "access token TTL must be shorter than refresh token TTL",
            ));
        }
        if self.attempt_threshold == 0 {
            return Err(AuthError::config("attempt threshold must be positive"));
        }
        Ok(())
    }
}

/// Parse environment variable with default value.
fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, AuthError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|e| AuthError::config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse the base64 signing secret, generating a random one for
/// development when unset.
fn parse_signing_secret() -> Result<Zeroizing<Vec<u8>>, AuthError> {
    match env::var("TOKEN_SIGNING_SECRET") {
        Ok(encoded) => {
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(&encoded)
                .map_err(|e| AuthError::config(format!("Invalid TOKEN_SIGNING_SECRET: {e}")))?;
            Ok(Zeroizing::new(bytes))
        }
        Err(_) => {
            use rand::RngCore;
            let mut secret = vec![0u8; 32];
            rand::thread_rng().fill_bytes(&mut secret);
            Ok(Zeroizing::new(secret))
        }
    }
}
