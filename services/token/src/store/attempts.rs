//! Per-principal login failure counter and lockout.

use authgate_common::{AuthError, CacheStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

fn attempts_key(principal: &str) -> String {
    format!("attempts:{principal}")
}

fn lock_key(principal: &str) -> String {
    format!("lock:{principal}")
}

/// Counts consecutive login failures and locks the account at a
/// threshold.
///
/// The lock marker overrides the counter: a locked principal is rejected
/// regardless of the counter value. Both records self-expire.
pub struct LoginAttemptGuard {
    cache: Arc<dyn CacheStore>,
    threshold: u32,
    window: Duration,
    lock_duration: Duration,
}

impl LoginAttemptGuard {
    /// Build a guard over the shared cache.
    #[must_use]
    pub fn new(
        cache: Arc<dyn CacheStore>,
        threshold: u32,
        window: Duration,
        lock_duration: Duration,
    ) -> Self {
        Self {
            cache,
            threshold,
            window,
            lock_duration,
        }
    }

    /// Record a failed login. At `threshold` failures the principal is
    /// locked for the configured duration and the counter resets.
    ///
    /// # Errors
    ///
    /// Returns an error if a cache operation fails.
    pub async fn on_failure(&self, principal: &str) -> Result<(), AuthError> {
        let count = self.cache.increment(&attempts_key(principal), self.window).await?;

        if count >= i64::from(self.threshold) {
            self.cache
                .set(&lock_key(principal), "1", Some(self.lock_duration))
                .await?;
            self.cache.delete(&attempts_key(principal)).await?;
            warn!(
                principal = %principal,
                failures = count,
                lock_secs = self.lock_duration.as_secs(),
                "Account locked after repeated login failures"
            );
        }
        Ok(())
    }

    /// Record a successful login, resetting the failure counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache delete fails.
    pub async fn on_success(&self, principal: &str) -> Result<(), AuthError> {
        self.cache.delete(&attempts_key(principal)).await
    }

    /// Whether the principal is currently locked.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache lookup fails.
    pub async fn is_locked(&self, principal: &str) -> Result<bool, AuthError> {
        self.cache.exists(&lock_key(principal)).await
    }

    /// Seconds until the lock expires; zero when not locked.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache TTL query fails.
    pub async fn remaining_lock_secs(&self, principal: &str) -> Result<u64, AuthError> {
        Ok(self
            .cache
            .ttl(&lock_key(principal))
            .await?
            .map_or(0, |ttl| ttl.as_secs()))
    }

    /// Reject with [`AuthError::AccountLocked`] if the principal is
    /// locked. Called before credential verification.
    ///
    /// # Errors
    ///
    /// `AccountLocked` carrying the remaining lock duration, or a cache
    /// error.
    pub async fn ensure_not_locked(&self, principal: &str) -> Result<(), AuthError> {
        if self.is_locked(principal).await? {
            let remaining = self.remaining_lock_secs(principal).await?;
            return Err(AuthError::AccountLocked {
                retry_after: Duration::from_secs(remaining),
            });
        }
        Ok(())
    }
}
