//! Cache layer
//!
//! A key/value store with per-entry time-to-live. The backend is chosen once
//! at construction: Redis when it is configured and answers a ping, the
//! in-process [`MemoryBackend`] otherwise. Callers only see [`Cache`], which
//! swallows every backend error: a failed read is a miss, a failed write is
//! a no-op. The cache is an optimization, never a source of truth.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::CacheConfig;

pub mod memory;
pub mod redis_backend;

pub use self::memory::MemoryBackend;
pub use self::redis_backend::RedisBackend;

/// Storage behind the [`Cache`] facade
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name for logs and diagnostics
    fn name(&self) -> &'static str;

    /// Value stored under `key`, or `None` when absent or expired
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key` for `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete every key matching `pattern`, see [`pattern_prefix`]
    async fn delete_by_prefix(&self, pattern: &str) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

/// Required key prefix for a caller-facing wildcard pattern.
///
/// Everything before the first `*` must prefix the key; a pattern without
/// `*` is used as a prefix as is.
#[must_use]
pub fn pattern_prefix(pattern: &str) -> &str {
    pattern.split('*').next().unwrap_or_default()
}

/// Error-absorbing cache handle shared by the search components
#[derive(Clone)]
pub struct Cache {
    backend: Arc<dyn CacheBackend>,
}

impl Cache {
    /// Wrap an explicit backend
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// In-process cache bounded to `max_entries`
    #[must_use]
    pub fn in_memory(max_entries: usize) -> Self {
        Self::new(Arc::new(MemoryBackend::new(max_entries)))
    }

    /// Pick the backend for `config`: Redis if configured and reachable,
    /// otherwise the in-process store.
    pub async fn connect(config: &CacheConfig) -> Self {
        let Some(url) = config.redis_url.as_deref().filter(|url| !url.is_empty()) else {
            info!(
                "No Redis URL configured, using in-process cache (max {} entries)",
                config.max_entries
            );
            return Self::in_memory(config.max_entries);
        };

        let timeout = Duration::from_millis(config.operation_timeout_ms);
        match RedisBackend::connect(url, &config.key_prefix, timeout).await {
            Ok(backend) => {
                info!("Using Redis cache backend");
                Self::new(Arc::new(backend))
            }
            Err(e) => {
                warn!("Redis unavailable, falling back to in-process cache: {}", e);
                Self::in_memory(config.max_entries)
            }
        }
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Raw bytes for `key`; backend failures read as a miss
    pub async fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        match self.backend.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key, backend = self.backend.name(), "Cache read failed: {}", e);
                None
            }
        }
    }

    /// Store raw bytes; backend failures are logged and ignored
    pub async fn set_bytes(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        if let Err(e) = self.backend.set(key, value, ttl).await {
            warn!(key, backend = self.backend.name(), "Cache write failed: {}", e);
        }
    }

    /// Decoded value for `key`, or `None` on miss, expiry or any failure
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get_bytes(key).await?;
        match postcard::from_bytes(&bytes) {
            Ok(value) => {
                debug!("Key found and still fresh");
                Some(value)
            }
            Err(e) => {
                warn!(key, "Dropping undecodable cache entry: {}", e);
                self.delete(key).await;
                None
            }
        }
    }

    /// Encode and store `value` with a time-to-live
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        match postcard::to_stdvec(value) {
            Ok(bytes) => self.set_bytes(key, bytes, ttl).await,
            Err(e) => warn!(key, "Could not encode cache value: {}", e),
        }
    }

    pub async fn delete(&self, key: &str) {
        if let Err(e) = self.backend.delete(key).await {
            warn!(key, backend = self.backend.name(), "Cache delete failed: {}", e);
        }
    }

    /// Delete every key matching `pattern` (`"prefix*"`)
    pub async fn delete_by_prefix(&self, pattern: &str) {
        if let Err(e) = self.backend.delete_by_prefix(pattern).await {
            warn!(
                pattern,
                backend = self.backend.name(),
                "Cache pattern delete failed: {}",
                e
            );
        }
    }

    pub async fn clear(&self) {
        if let Err(e) = self.backend.clear().await {
            warn!(backend = self.backend.name(), "Cache clear failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GeoSearchError;
    use serde::Deserialize;

    struct BrokenBackend;

    #[async_trait]
    impl CacheBackend for BrokenBackend {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>> {
            Err(GeoSearchError::unavailable("cache", "connection refused"))
        }

        async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<()> {
            Err(GeoSearchError::unavailable("cache", "connection refused"))
        }

        async fn delete(&self, _key: &str) -> Result<()> {
            Err(GeoSearchError::unavailable("cache", "connection refused"))
        }

        async fn delete_by_prefix(&self, _pattern: &str) -> Result<()> {
            Err(GeoSearchError::unavailable("cache", "connection refused"))
        }

        async fn clear(&self) -> Result<()> {
            Err(GeoSearchError::unavailable("cache", "connection refused"))
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Payload {
        name: String,
        count: u32,
    }

    #[test]
    fn test_pattern_prefix() {
        assert_eq!(pattern_prefix("search:*"), "search:");
        assert_eq!(pattern_prefix("search:stats"), "search:stats");
        assert_eq!(pattern_prefix("*"), "");
    }

    #[tokio::test]
    async fn test_typed_round_trip() {
        let cache = Cache::in_memory(16);
        let payload = Payload {
            name: "Shinjuku".to_string(),
            count: 3,
        };
        cache.put("k", &payload, Duration::from_secs(60)).await;
        assert_eq!(cache.get::<Payload>("k").await, Some(payload));
        assert_eq!(cache.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_backend_errors_are_swallowed() {
        let cache = Cache::new(Arc::new(BrokenBackend));
        cache.put("k", &1u32, Duration::from_secs(60)).await;
        assert_eq!(cache.get::<u32>("k").await, None);
        cache.delete("k").await;
        cache.delete_by_prefix("k*").await;
        cache.clear().await;
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let cache = Cache::in_memory(16);
        cache.set_bytes("k", vec![0xff], Duration::from_secs(60)).await;
        assert_eq!(cache.get::<Payload>("k").await, None);
        assert_eq!(cache.get_bytes("k").await, None);
    }

    #[tokio::test]
    async fn test_connect_without_redis_uses_memory() {
        let config = CacheConfig::default();
        let cache = Cache::connect(&config).await;
        assert_eq!(cache.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_connect_falls_back_when_redis_unreachable() {
        let config = CacheConfig {
            redis_url: Some("redis://127.0.0.1:1/".to_string()),
            operation_timeout_ms: 200,
            ..CacheConfig::default()
        };
        let cache = Cache::connect(&config).await;
        assert_eq!(cache.backend_name(), "memory");
    }
}
