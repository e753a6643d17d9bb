//! Redis-backed [`CacheStore`] implementation.
//!
//! Production backend shared by every service instance. Uses a
//! `ConnectionManager` so reconnects are handled by the client; no retries
//! are layered on top — the client's own timeout is the only bound.

use crate::cache::CacheStore;
use crate::error::AuthError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Conditional overwrite evaluated atomically server-side.
const CAS_SCRIPT: &str = r"
if redis.call('GET', KEYS[1]) == ARGV[1] then
  redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
  return 1
else
  return 0
end
";

/// Counter increment that applies the window TTL in the same round-trip
/// as counter creation, so a counter can never outlive its window.
const INCR_SCRIPT: &str = r"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
  redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return count
";

/// Cache backend over a shared Redis cluster.
pub struct RedisCache {
    conn: Arc<RwLock<ConnectionManager>>,
    cas: redis::Script,
    incr: redis::Script,
}

impl RedisCache {
    /// Connect to Redis at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client or connection manager cannot be
    /// created.
    pub async fn connect(url: &str) -> Result<Self, AuthError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        debug!("redis connection manager established");

        Ok(Self {
            conn: Arc::new(RwLock::new(conn)),
            cas: redis::Script::new(CAS_SCRIPT),
            incr: redis::Script::new(INCR_SCRIPT),
        })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        let mut conn = self.conn.write().await;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), AuthError> {
        let mut conn = self.conn.write().await;
        match ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1)).await?,
            None => conn.set::<_, _, ()>(key, value).await?,
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AuthError> {
        let mut conn = self.conn.write().await;
        conn.del::<_, ()>(key).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AuthError> {
        let mut conn = self.conn.write().await;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, AuthError> {
        let mut conn = self.conn.write().await;
        // TTL returns -2 for a missing key and -1 for a key with no expiry.
        let secs: i64 = conn.ttl(key).await?;
        if secs < 0 {
            Ok(None)
        } else {
            Ok(Some(Duration::from_secs(secs as u64)))
        }
    }

    async fn increment(&self, key: &str, window: Duration) -> Result<i64, AuthError> {
        let mut conn = self.conn.write().await;
        let count: i64 = self
            .incr
            .key(key)
            .arg(window.as_secs().max(1))
            .invoke_async(&mut *conn)
            .await?;
        Ok(count)
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: &str,
        new: &str,
        ttl: Duration,
    ) -> Result<bool, AuthError> {
        let mut conn = self.conn.write().await;
        let swapped: i64 = self
            .cas
            .key(key)
            .arg(expected)
            .arg(new)
            .arg(ttl.as_secs().max(1))
            .invoke_async(&mut *conn)
            .await?;
        if swapped == 0 {
            debug!(key, "compare-and-swap lost against a newer value");
        }
        Ok(swapped == 1)
    }
}
