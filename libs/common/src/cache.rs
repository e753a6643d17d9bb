//! Narrow key-value cache interface and in-memory backend.
//!
//! Every stateful component (revocation list, refresh sessions, login
//! attempt counters) touches shared state only through [`CacheStore`], so
//! an in-memory fake can back unit tests deterministically and the Redis
//! backend can be swapped in without touching the components.

use crate::error::AuthError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// String-keyed cache interface consumed by all stateful components.
///
/// All access is single-key; there are no multi-key transactions.
/// `increment` and `compare_and_swap` are the two single-key atomic
/// operations the attempt guard and refresh rotation rely on.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the value stored at `key`, if present and unexpired.
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError>;

    /// Set `key` to `value`, with an optional time-to-live.
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), AuthError>;

    /// Delete `key`. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), AuthError>;

    /// Whether `key` currently exists.
    async fn exists(&self, key: &str) -> Result<bool, AuthError>;

    /// Remaining time-to-live of `key`, or `None` if the key is absent or
    /// has no expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, AuthError>;

    /// Atomically increment the counter at `key` and return the new value.
    ///
    /// The `window` TTL is applied only when the counter is created by
    /// this call; later increments within the window do not extend it.
    async fn increment(&self, key: &str, window: Duration) -> Result<i64, AuthError>;

    /// Atomically replace the value at `key` with `new` (and TTL `ttl`)
    /// if the current value equals `expected`. Returns whether the swap
    /// happened.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new: &str,
        ttl: Duration,
    ) -> Result<bool, AuthError>;
}

struct MemoryEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Instant::now())
    }
}

/// In-memory [`CacheStore`] backend.
///
/// Deterministic and self-contained; used by unit and scenario tests, and
/// usable as a single-process fallback. Expired entries are purged lazily
/// on access.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryCache {
    /// Create an empty in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the entry at `key` if it has expired, returning the live
    /// entry's value otherwise.
    async fn take_live(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        Ok(self.take_live(key).await)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), AuthError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: ttl.map(|t| Instant::now() + t),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        let mut entries = self.entries.write().await;
        entries.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AuthError> {
        Ok(self.take_live(key).await.is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, AuthError> {
        if self.take_live(key).await.is_none() {
            return Ok(None);
        }
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) => Ok(entry
                .expires_at
                .map(|at| at.saturating_duration_since(Instant::now()))),
            None => Ok(None),
        }
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<i64, AuthError> {
        let mut entries = self.entries.write().await;
        let (current, expires_at) = match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let count: i64 = entry
                    .value
                    .parse()
                    .map_err(|_| AuthError::cache(format!("non-numeric counter at {key}")))?;
                (count, entry.expires_at)
            }
            _ => (0, Some(Instant::now() + window)),
        };
        let next = current + 1;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: next.to_string(),
                expires_at,
            },
        );
        Ok(next)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new: &str,
        ttl: Duration,
    ) -> Result<bool, AuthError> {
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.is_expired()) {
            entries.remove(key);
        }
        let matches = entries.get(key).is_some_and(|e| e.value == expected);
        if matches {
            entries.insert(
                key.to_string(),
                MemoryEntry {
                    value: new.to_string(),
                    expires_at: Some(Instant::now() + ttl),
                },
            );
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryCache::new();

        cache.set("k", "v", None).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));
        assert!(cache.exists("k").await.unwrap());

        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(!cache.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let cache = MemoryCache::new();

        cache
            .set("k", "v", Some(Duration::from_millis(20)))
            .await
            .unwrap();
        assert!(cache.exists("k").await.unwrap());

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!cache.exists("k").await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expired_entries_removed_on_access() {
        let cache = MemoryCache::new();

        cache
            .set("k", "v", Some(Duration::from_millis(10)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(cache.entries.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_ttl_reports_remaining() {
        let cache = MemoryCache::new();

        cache
            .set("k", "v", Some(Duration::from_secs(60)))
            .await
            .unwrap();
        let remaining = cache.ttl("k").await.unwrap().unwrap();
        assert!(remaining <= Duration::from_secs(60));
        assert!(remaining > Duration::from_secs(58));

        cache.set("forever", "v", None).await.unwrap();
        assert_eq!(cache.ttl("forever").await.unwrap(), None);
        assert_eq!(cache.ttl("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_counts_up() {
        let cache = MemoryCache::new();
        let window = Duration::from_secs(60);

        assert_eq!(cache.increment("c", window).await.unwrap(), 1);
        assert_eq!(cache.increment("c", window).await.unwrap(), 2);
        assert_eq!(cache.increment("c", window).await.unwrap(), 3);

        cache.delete("c").await.unwrap();
        assert_eq!(cache.increment("c", window).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_compare_and_swap() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_secs(60);

        cache.set("k", "old", Some(ttl)).await.unwrap();

        assert!(cache.compare_and_swap("k", "old", "new", ttl).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));

        // A second swap against the superseded value must lose.
        assert!(!cache.compare_and_swap("k", "old", "other", ttl).await.unwrap());
        assert_eq!(cache.get("k").await.unwrap(), Some("new".to_string()));

        assert!(!cache.compare_and_swap("absent", "x", "y", ttl).await.unwrap());
    }
}
