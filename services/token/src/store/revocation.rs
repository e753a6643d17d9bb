//! TTL-bounded deny list of token ids.

use authgate_common::{AuthError, CacheStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

fn revocation_key(jti: &str) -> String {
    format!("revoked:{jti}")
}

/// Maps a token id to "revoked" for the token's remaining lifetime.
///
/// Entries self-expire when the token would have expired anyway, so the
/// list never outgrows the set of still-live revoked tokens.
pub struct RevocationStore {
    cache: Arc<dyn CacheStore>,
}

impl RevocationStore {
    /// Build a store over the shared cache.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Revoke the token id until `expires_at_millis`.
    ///
    /// The entry TTL is the token's remaining lifetime at the moment of
    /// revocation; an already-expired token needs no entry and the write
    /// is skipped entirely. Revoking twice is harmless.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache write fails.
    pub async fn revoke(&self, jti: &str, expires_at_millis: i64) -> Result<(), AuthError> {
        let now = chrono::Utc::now().timestamp_millis();
        let remaining_ms = expires_at_millis - now;
        if remaining_ms <= 0 {
            debug!(jti = %jti, "Skipping revocation of already-expired token");
            return Ok(());
        }

        self.cache
            .set(
                &revocation_key(jti),
                "1",
                Some(Duration::from_millis(remaining_ms as u64)),
            )
            .await?;
        debug!(jti = %jti, remaining_ms = remaining_ms, "Revoked token");
        Ok(())
    }

    /// Whether the token id is on the deny list.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lookup fails; callers treat that as
    /// a rejection (fail-closed), never as "not revoked".
    pub async fn is_revoked(&self, jti: &str) -> Result<bool, AuthError> {
        self.cache.exists(&revocation_key(jti)).await
    }
}
