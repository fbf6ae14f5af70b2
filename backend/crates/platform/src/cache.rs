//! Expiring Key-Value Cache
//!
//! Shared expiring store used for cross-request coordination (rate-limit
//! counters and similar best-effort state). Backends are swappable; the
//! in-memory implementation below is the default for tests and
//! single-process deployments.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::Mutex;

/// Cache operation errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Expiring key-value store contract.
///
/// `increment` creates the counter at 1 with the given TTL when absent, and
/// leaves the remaining TTL untouched when present. `put` always resets the
/// TTL.
#[trait_variant::make(CacheStore: Send)]
pub trait LocalCacheStore {
    /// Get a value, or `None` when absent/expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a value with a time-to-live.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Increment a numeric counter, returning the new value.
    async fn increment(&self, key: &str, ttl: Duration) -> CacheResult<i64>;

    /// Remove a key.
    async fn forget(&self, key: &str) -> CacheResult<()>;
}

/// In-memory cache with per-entry expiry.
///
/// Expired entries are dropped lazily on access.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn increment(&self, key: &str, ttl: Duration) -> CacheResult<i64> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.get_mut(key) {
            Some(entry) if entry.expires_at > now => {
                let current: i64 = entry.value.parse().unwrap_or(0);
                entry.value = (current + 1).to_string();
                Ok(current + 1)
            }
            _ => {
                entries.insert(
                    key.to_string(),
                    CacheEntry {
                        value: "1".to_string(),
                        expires_at: now + ttl,
                    },
                );
                Ok(1)
            }
        }
    }

    async fn forget(&self, key: &str) -> CacheResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_forget() {
        let cache = MemoryCache::new();
        cache
            .put("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some("v".to_string()));

        cache.forget("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expiry() {
        let cache = MemoryCache::new();
        cache.put("k", "v", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_increment_counts_up() {
        let cache = MemoryCache::new();
        assert_eq!(cache.increment("c", Duration::from_secs(60)).await.unwrap(), 1);
        assert_eq!(cache.increment("c", Duration::from_secs(60)).await.unwrap(), 2);
        assert_eq!(cache.increment("c", Duration::from_secs(60)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_increment_restarts_after_expiry() {
        let cache = MemoryCache::new();
        cache.increment("c", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.increment("c", Duration::from_secs(60)).await.unwrap(), 1);
    }
}
