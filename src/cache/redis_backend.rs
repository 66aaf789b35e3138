//! Redis cache backend
//!
//! Every command is bounded by the configured operation timeout. Keys are
//! namespaced with a configurable prefix so pattern deletes stay inside this
//! application's keys.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use tokio::time::timeout;
use tracing::debug;

use super::{CacheBackend, pattern_prefix};
use crate::{GeoSearchError, Result};

/// Cache backend delegating to a Redis server
#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
    key_prefix: String,
    timeout: Duration,
}

impl RedisBackend {
    /// Open a managed connection and verify it with `PING`
    pub async fn connect(url: &str, key_prefix: &str, op_timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let connection = timeout(op_timeout, client.get_connection_manager())
            .await
            .map_err(|_| GeoSearchError::unavailable("redis", "connection timed out"))??;

        let backend = Self {
            connection,
            key_prefix: key_prefix.to_string(),
            timeout: op_timeout,
        };
        backend.ping().await?;
        Ok(backend)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        let reply: String = self
            .bounded("PING", async move { redis::cmd("PING").query_async(&mut conn).await })
            .await?;
        debug!("Redis answered {}", reply);
        Ok(())
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{key}", self.key_prefix)
    }

    async fn bounded<T, F>(&self, command: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match timeout(self.timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(GeoSearchError::unavailable(
                "redis",
                format!("{command} timed out after {:?}", self.timeout),
            )),
        }
    }
}

/// Redis expiries are whole seconds and must be positive
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs_f64().ceil().max(1.0) as u64
}

/// `KEYS` pattern matching exactly the keys that start with `prefix`
fn prefix_glob(prefix: &str) -> String {
    let mut glob = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            glob.push('\\');
        }
        glob.push(c);
    }
    glob.push('*');
    glob
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let key = self.namespaced(key);
        self.bounded("GET", async move { conn.get::<_, Option<Vec<u8>>>(key).await })
            .await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.connection.clone();
        let key = self.namespaced(key);
        let seconds = ttl_seconds(ttl);
        self.bounded("SET", async move {
            conn.set_ex::<_, _, ()>(key, value, seconds).await
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let key = self.namespaced(key);
        self.bounded("DEL", async move { conn.del::<_, ()>(key).await })
            .await
    }

    async fn delete_by_prefix(&self, pattern: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let glob = prefix_glob(&self.namespaced(pattern_prefix(pattern)));
        let keys: Vec<String> = self
            .bounded("KEYS", async move { conn.keys::<_, Vec<String>>(glob).await })
            .await?;
        if keys.is_empty() {
            return Ok(());
        }

        debug!(pattern, "Deleting {} Redis keys", keys.len());
        let mut conn = self.connection.clone();
        self.bounded("DEL", async move { conn.del::<_, ()>(keys).await })
            .await
    }

    async fn clear(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        self.bounded("FLUSHDB", async move {
            redis::cmd("FLUSHDB").query_async::<()>(&mut conn).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_seconds_rounds_up() {
        assert_eq!(ttl_seconds(Duration::from_millis(1)), 1);
        assert_eq!(ttl_seconds(Duration::ZERO), 1);
        assert_eq!(ttl_seconds(Duration::from_millis(1_500)), 2);
        assert_eq!(ttl_seconds(Duration::from_secs(300)), 300);
    }

    #[test]
    fn test_prefix_glob_escapes_metacharacters() {
        assert_eq!(prefix_glob("geosearch:search:"), "geosearch:search:*");
        assert_eq!(prefix_glob(""), "*");
        assert_eq!(
            prefix_glob(&format!("geosearch:{}", pattern_prefix("x?*"))),
            "geosearch:x\\?*"
        );
        assert_eq!(prefix_glob(r"a[b]\c"), r"a\[b\]\\c*");
    }

    #[tokio::test]
    async fn test_connect_refused_is_unavailable() {
        let result =
            RedisBackend::connect("redis://127.0.0.1:1/", "test:", Duration::from_millis(200)).await;
        assert!(matches!(result, Err(e) if e.is_unavailable()));
    }

    #[tokio::test]
    async fn test_invalid_url_is_an_error() {
        let result = RedisBackend::connect("not a url", "test:", Duration::from_millis(200)).await;
        assert!(result.is_err());
    }
}
