//! In-process cache backend
//!
//! A single mutex guards the map. Expired entries are purged when read, and
//! when a write pushes the map past `max_entries` the entries closest to
//! expiry are evicted first until the map is back at capacity. Eviction only
//! runs on writes that overflow, never on reads or on a timer.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tracing::debug;

use super::{CacheBackend, pattern_prefix};
use crate::{GeoSearchError, Result};

struct StoredEntry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl StoredEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Bounded in-process TTL store
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, StoredEntry>>,
    max_entries: usize,
}

impl MemoryBackend {
    /// Create a store holding at most `max_entries` (at least one)
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, StoredEntry>>> {
        self.entries
            .lock()
            .map_err(|_| GeoSearchError::cache("in-process cache lock poisoned"))
    }

    /// Drop soonest-expiring entries until the map fits, sparing `keep`
    fn evict(&self, entries: &mut HashMap<String, StoredEntry>, keep: &str) {
        let overflow = entries.len().saturating_sub(self.max_entries);
        if overflow == 0 {
            return;
        }

        let mut candidates: Vec<(Instant, String)> = entries
            .iter()
            .filter(|(key, _)| key.as_str() != keep)
            .map(|(key, entry)| (entry.expires_at, key.clone()))
            .collect();
        candidates.sort_unstable();

        for (_, key) in candidates.into_iter().take(overflow) {
            entries.remove(&key);
        }
        debug!("Evicted {} entries from in-process cache", overflow);
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                debug!(key, "Key found but expired");
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| GeoSearchError::cache("TTL overflow"))?;
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), StoredEntry { value, expires_at });
        if entries.len() > self.max_entries {
            self.evict(&mut entries, key);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, pattern: &str) -> Result<()> {
        let prefix = pattern_prefix(pattern);
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        debug!(pattern, "Deleted {} entries", before - entries.len());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
