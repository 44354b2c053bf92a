//! In-memory cache implementation with LRU eviction.
//!
//! Provides a thread-safe in-memory cache with TTL support using
//! tokio synchronization primitives and LRU eviction policy.
//!
//! Mirrors the Redis backend: list page keys are tracked per entity prefix
//! so that prefix deletion does not need to walk the whole store.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use refdata_core::cache::{extract_prefix_from_key, is_list_key, Cache, Result};

/// A single cache entry with optional expiration.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        Self { value, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// In-memory cache implementation with LRU eviction.
///
/// Supports TTL with lazy expiration: an expired entry is dropped the next
/// time it is read. Uses LRU eviction once `max_entries` is reached.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    /// Main key-value store with LRU eviction.
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
    /// List page keys by entity prefix.
    tracking: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl MemoryCache {
    /// Creates a new in-memory cache holding at most `max_entries` values.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
            tracking: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Drops a list key that left the store from its prefix's tracking set.
    async fn forget(&self, key: &str) {
        if is_list_key(key) {
            if let Some(prefix) = extract_prefix_from_key(key) {
                self.untrack(prefix, &[key.to_string()]).await;
            }
        }
    }

    async fn untrack(&self, prefix: &str, keys: &[String]) {
        let mut tracking = self.tracking.write().await;
        if let Some(tracked) = tracking.get_mut(prefix) {
            for key in keys {
                tracked.remove(key);
            }
            if tracked.is_empty() {
                tracking.remove(prefix);
            }
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut store = self.store.write().await;

        let expired = match store.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            store.pop(key);
            drop(store);
            self.forget(key).await;
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let evicted = {
            let mut store = self.store.write().await;
            store
                .push(key.to_string(), CacheEntry::new(value.to_vec(), ttl))
                .map(|(old_key, _)| old_key)
                .filter(|old_key| old_key != key)
        };

        if let Some(evicted) = evicted {
            self.forget(&evicted).await;
        }

        if is_list_key(key) {
            if let Some(prefix) = extract_prefix_from_key(key) {
                let mut tracking = self.tracking.write().await;
                tracking
                    .entry(prefix.to_string())
                    .or_default()
                    .insert(key.to_string());
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.forget(key).await;

        let mut store = self.store.write().await;
        store.pop(key);

        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        let entity = extract_prefix_from_key(prefix);

        let keys_to_delete: Vec<String> = match entity {
            Some(entity) if is_list_key(prefix) => {
                let tracking = self.tracking.read().await;
                tracking
                    .get(entity)
                    .map(|keys| {
                        keys.iter()
                            .filter(|k| k.starts_with(prefix))
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default()
            }
            // Untracked prefix: walk the store.
            _ => {
                let store = self.store.read().await;
                store
                    .iter()
                    .filter(|(key, _)| key.starts_with(prefix))
                    .map(|(key, _)| key.clone())
                    .collect()
            }
        };

        if keys_to_delete.is_empty() {
            return Ok(());
        }

        {
            let mut store = self.store.write().await;
            for key in &keys_to_delete {
                store.pop(key);
            }
        }

        if let Some(entity) = entity {
            self.untrack(entity, &keys_to_delete).await;
        }

        Ok(())
    }
}
