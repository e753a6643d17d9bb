//! Single active refresh session per principal.

use authgate_common::{AuthError, CacheStore};
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;

fn session_key(principal: &str) -> String {
    format!("session:{principal}")
}

/// Maps a principal to its one currently-valid refresh-token id.
///
/// The equality check in [`is_current`](Self::is_current) is what makes a
/// refresh token single-use: once superseded, the old id no longer
/// matches even though its own signature and expiry are still valid.
pub struct RefreshSessionStore {
    cache: Arc<dyn CacheStore>,
}

impl RefreshSessionStore {
    /// Build a store over the shared cache.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    /// Register `jti` as the principal's active refresh token,
    /// unconditionally overwriting any previous session.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache write fails.
    pub async fn store(&self, principal: &str, jti: &str, ttl: Duration) -> Result<(), AuthError> {
        self.cache.set(&session_key(principal), jti, Some(ttl)).await
    }

    /// Whether `jti` is the principal's currently registered refresh id.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lookup fails.
    pub async fn is_current(&self, principal: &str, jti: &str) -> Result<bool, AuthError> {
        match self.cache.get(&session_key(principal)).await? {
            Some(current) => Ok(current.as_bytes().ct_eq(jti.as_bytes()).into()),
            None => Ok(false),
        }
    }

    /// Atomically replace `old_jti` with `new_jti` if it is still current.
    ///
    /// Returns `false` when the stored id no longer matches, which is how
    /// a concurrent duplicate rotation loses.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache operation fails.
    pub async fn replace_if_current(
        &self,
        principal: &str,
        old_jti: &str,
        new_jti: &str,
        ttl: Duration,
    ) -> Result<bool, AuthError> {
        self.cache
            .compare_and_swap(&session_key(principal), old_jti, new_jti, ttl)
            .await
    }

    /// Remove the principal's active session. Used at logout.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache delete fails.
    pub async fn remove(&self, principal: &str) -> Result<(), AuthError> {
        self.cache.delete(&session_key(principal)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authgate_common::MemoryCache;

    const TTL: Duration = Duration::from_secs(3600);

    fn store() -> RefreshSessionStore {
        RefreshSessionStore::new(Arc::new(MemoryCache::new()))
    }

    #[tokio::test]
    async fn test_store_and_check() {
        let sessions = store();

        sessions.store("alice", "jti-1", TTL).await.unwrap();
        assert!(sessions.is_current("alice", "jti-1").await.unwrap());
        assert!(!sessions.is_current("alice", "jti-2").await.unwrap());
        assert!(!sessions.is_current("bob", "jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_supersedes_old_id() {
        let sessions = store();

        sessions.store("alice", "jti-1", TTL).await.unwrap();
        sessions.store("alice", "jti-2", TTL).await.unwrap();

        assert!(!sessions.is_current("alice", "jti-1").await.unwrap());
        assert!(sessions.is_current("alice", "jti-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_replace_if_current() {
        let sessions = store();

        sessions.store("alice", "jti-1", TTL).await.unwrap();

        assert!(sessions
            .replace_if_current("alice", "jti-1", "jti-2", TTL)
            .await
            .unwrap());
        // Losing duplicate: jti-1 is no longer current.
        assert!(!sessions
            .replace_if_current("alice", "jti-1", "jti-3", TTL)
            .await
            .unwrap());
        assert!(sessions.is_current("alice", "jti-2").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove() {
        let sessions = store();

        sessions.store("alice", "jti-1", TTL).await.unwrap();
        sessions.remove("alice").await.unwrap();
        assert!(!sessions.is_current("alice", "jti-1").await.unwrap());
    }
}
