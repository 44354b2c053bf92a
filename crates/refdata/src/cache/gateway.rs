//! Typed, best-effort front for a [`Cache`] backend.
//!
//! The cache is an optimization. Every failure here is logged and turns
//! into a miss (for reads) or a no-op (for writes and removals); callers
//! then fall through to the repository.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use refdata_core::cache::{deserialize, serialize, Cache};

/// Serializes values in and out of a byte cache with per-kind TTLs.
#[derive(Clone)]
pub struct CacheGateway {
    cache: Arc<dyn Cache>,
    entity_ttl: Duration,
    list_ttl: Duration,
}

impl CacheGateway {
    pub fn new(cache: Arc<dyn Cache>, entity_ttl: Duration, list_ttl: Duration) -> Self {
        Self {
            cache,
            entity_ttl,
            list_ttl,
        }
    }

    /// Reads a single cached entity.
    pub async fn get_entity<T: DeserializeOwned>(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Option<T> {
        self.get(key, cancel).await
    }

    /// Caches a single entity with the entity TTL.
    pub async fn set_entity<T: Serialize>(&self, key: &str, value: &T, cancel: &CancellationToken) {
        self.set(key, value, self.entity_ttl, cancel).await
    }

    /// Reads a cached page.
    pub async fn get_page<T: DeserializeOwned>(
        &self,
        key: &str,
        cancel: &CancellationToken,
    ) -> Option<T> {
        self.get(key, cancel).await
    }

    /// Caches a page with the list TTL.
    pub async fn set_page<T: Serialize>(&self, key: &str, value: &T, cancel: &CancellationToken) {
        self.set(key, value, self.list_ttl, cancel).await
    }

    /// Removes one key.
    ///
    /// Runs after a committed write, so it is not cancellable.
    pub async fn remove(&self, key: &str) {
        if let Err(err) = self.cache.delete(key).await {
            tracing::warn!(key, error = %err, "Failed to invalidate cache key");
        }
    }

    /// Removes every key starting with `prefix`. Not cancellable.
    pub async fn remove_by_prefix(&self, prefix: &str) {
        if let Err(err) = self.cache.delete_prefix(prefix).await {
            tracing::warn!(prefix, error = %err, "Failed to invalidate cache prefix");
        }
    }

    async fn get<T: DeserializeOwned>(&self, key: &str, cancel: &CancellationToken) -> Option<T> {
        let bytes = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(key, "Cache read cancelled");
                return None;
            }
            result = self.cache.get(key) => match result {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    tracing::trace!(key, "Cache miss");
                    return None;
                }
                Err(err) => {
                    tracing::warn!(key, error = %err, "Cache read failed");
                    return None;
                }
            },
        };

        match deserialize(&bytes) {
            Ok(value) => {
                tracing::trace!(key, "Cache hit");
                Some(value)
            }
            Err(err) => {
                // Treat as a miss; the next write overwrites the entry.
                tracing::warn!(key, error = %err, "Cache deserialization failed");
                None
            }
        }
    }

    async fn set<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
        cancel: &CancellationToken,
    ) {
        let bytes = match serialize(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(key, error = %err, "Cache serialization failed");
                return;
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(key, "Cache write cancelled");
            }
            result = self.cache.set(key, &bytes, Some(ttl)) => {
                if let Err(err) = result {
                    tracing::warn!(key, error = %err, "Failed to populate cache");
                }
            }
        }
    }
}
