//! Rate Limiting Infrastructure
//!
//! Per-origin attempt limiter backed by the expiring cache. Used to throttle
//! login-class endpoints: each attempt increments a counter keyed by the
//! request origin; once the limit is reached, further checks are rejected
//! and the block window is refreshed so continued abuse extends it.

use std::time::Duration;

use crate::cache::{CacheResult, CacheStore};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum attempts allowed in the window
    pub max_attempts: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn new(max_attempts: u32, window_secs: u64) -> Self {
        Self {
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    /// Limit reached; the window expiry has been refreshed.
    Blocked,
}

/// Per-origin attempt limiter over a [`CacheStore`].
pub struct RateLimiter<C> {
    store: C,
    prefix: &'static str,
}

impl<C> RateLimiter<C>
where
    C: CacheStore + Sync,
{
    pub fn new(store: C, prefix: &'static str) -> Self {
        Self { store, prefix }
    }

    fn key(&self, origin: &str) -> String {
        format!("{}:{}", self.prefix, origin)
    }

    /// Check whether an attempt from this origin may proceed.
    ///
    /// A blocked origin has its counter re-written with a fresh TTL, so the
    /// block lasts a full window from the most recent attempt.
    pub async fn check(
        &self,
        origin: &str,
        config: &RateLimitConfig,
    ) -> CacheResult<RateLimitDecision> {
        let key = self.key(origin);
        let count: i64 = match self.store.get(&key).await? {
            Some(value) => value.parse().unwrap_or(0),
            None => 0,
        };

        if count >= i64::from(config.max_attempts) {
            self.store
                .put(&key, &count.to_string(), config.window)
                .await?;
            return Ok(RateLimitDecision::Blocked);
        }

        Ok(RateLimitDecision::Allowed)
    }

    /// Record an attempt from this origin.
    ///
    /// Recording must not be skipped silently; cache failures propagate to
    /// the caller.
    pub async fn record_attempt(&self, origin: &str, config: &RateLimitConfig) -> CacheResult<i64> {
        self.store.increment(&self.key(origin), config.window).await
    }

    /// Clear the origin's counter (after successful authentication).
    pub async fn clear(&self, origin: &str) -> CacheResult<()> {
        self.store.forget(&self.key(origin)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    fn limiter() -> RateLimiter<MemoryCache> {
        RateLimiter::new(MemoryCache::new(), "login")
    }

    #[tokio::test]
    async fn test_allows_until_limit() {
        let limiter = limiter();
        let config = RateLimitConfig::new(5, 60);

        for _ in 0..5 {
            assert_eq!(
                limiter.check("10.0.0.1", &config).await.unwrap(),
                RateLimitDecision::Allowed
            );
            limiter.record_attempt("10.0.0.1", &config).await.unwrap();
        }

        // 6th attempt within the window is blocked
        assert_eq!(
            limiter.check("10.0.0.1", &config).await.unwrap(),
            RateLimitDecision::Blocked
        );
    }

    #[tokio::test]
    async fn test_origins_are_independent() {
        let limiter = limiter();
        let config = RateLimitConfig::new(1, 60);

        limiter.record_attempt("10.0.0.1", &config).await.unwrap();
        assert_eq!(
            limiter.check("10.0.0.1", &config).await.unwrap(),
            RateLimitDecision::Blocked
        );
        assert_eq!(
            limiter.check("10.0.0.2", &config).await.unwrap(),
            RateLimitDecision::Allowed
        );
    }

    #[tokio::test]
    async fn test_clear_resets_origin() {
        let limiter = limiter();
        let config = RateLimitConfig::new(1, 60);

        limiter.record_attempt("10.0.0.1", &config).await.unwrap();
        assert_eq!(
            limiter.check("10.0.0.1", &config).await.unwrap(),
            RateLimitDecision::Blocked
        );

        limiter.clear("10.0.0.1").await.unwrap();
        assert_eq!(
            limiter.check("10.0.0.1", &config).await.unwrap(),
            RateLimitDecision::Allowed
        );
    }

    #[tokio::test]
    async fn test_window_expires() {
        let limiter = limiter();
        let config = RateLimitConfig {
            max_attempts: 1,
            window: Duration::from_millis(20),
        };

        limiter.record_attempt("10.0.0.1", &config).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            limiter.check("10.0.0.1", &config).await.unwrap(),
            RateLimitDecision::Allowed
        );
    }

    #[tokio::test]
    async fn test_block_refreshes_window() {
        let limiter = limiter();
        let config = RateLimitConfig {
            max_attempts: 1,
            window: Duration::from_millis(40),
        };

        limiter.record_attempt("10.0.0.1", &config).await.unwrap();

        // Each blocked check rewrites the counter with a fresh TTL.
        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(25)).await;
            assert_eq!(
                limiter.check("10.0.0.1", &config).await.unwrap(),
                RateLimitDecision::Blocked
            );
        }
    }
}
