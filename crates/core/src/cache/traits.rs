use std::time::Duration;

use async_trait::async_trait;

use super::Result;

/// Trait for basic cache operations over raw bytes.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Gets a value from the cache by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Sets a value in the cache with an optional TTL.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()>;

    /// Deletes a value from the cache by key.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Deletes every value whose key starts with `prefix` (e.g. `"country:list:"`).
    async fn delete_prefix(&self, prefix: &str) -> Result<()>;
}
