//! Redis cache implementation.
//!
//! List page keys are tracked in one Redis Set per entity prefix, so prefix
//! deletion never needs SCAN.
//!
//! A tracking set expires no earlier than the newest list page it tracks.
//! Members whose page already expired are pruned by `delete_prefix`.
//!
//! The commands issued by `set`, `delete` and `delete_prefix` are not
//! atomic. A crash between them leaves at worst a stale member in a
//! tracking set, which the next `delete_prefix` removes harmlessly since
//! DEL and SREM on missing keys are no-ops.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use refdata_core::cache::{extract_prefix_from_key, is_list_key, tracking_key, Cache, Result};

use super::error::map_redis_error;

/// Redis cache backend using connection manager for pooling.
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    /// Creates a new Redis cache connection.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        Ok(Self { conn })
    }
}

/// Keeps a tracking set alive at least as long as the page just added to it.
///
/// A page without TTL makes the set persistent.
async fn extend_tracking(
    conn: &mut redis::aio::ConnectionManager,
    tracking: &str,
    ttl: Option<Duration>,
) -> Result<()> {
    let Some(duration) = ttl else {
        conn.persist::<_, ()>(tracking)
            .await
            .map_err(map_redis_error)?;
        return Ok(());
    };

    let seconds = duration.as_secs().max(1) as i64;
    // -1 means the set has no expiry.
    let current: i64 = conn.ttl(tracking).await.map_err(map_redis_error)?;
    if current != -1 && current < seconds {
        conn.expire::<_, ()>(tracking, seconds)
            .await
            .map_err(map_redis_error)?;
    }
    Ok(())
}

/// Tracked members outside `deleting` whose page has already expired.
async fn stale_members<'a>(
    conn: &mut redis::aio::ConnectionManager,
    tracked: &'a [String],
    deleting: &[&String],
) -> Result<Vec<&'a String>> {
    let remaining: Vec<&String> = tracked.iter().filter(|k| !deleting.contains(k)).collect();
    if remaining.is_empty() {
        return Ok(Vec::new());
    }

    let mut pipe = redis::pipe();
    for key in &remaining {
        pipe.exists(*key);
    }
    let alive: Vec<bool> = pipe.query_async(conn).await.map_err(map_redis_error)?;

    Ok(remaining
        .into_iter()
        .zip(alive)
        .filter(|(_, alive)| !alive)
        .map(|(key, _)| key)
        .collect())
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let result: Option<Vec<u8>> = conn.get(key).await.map_err(map_redis_error)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();

        match ttl {
            Some(duration) => {
                let seconds = duration.as_secs().max(1);
                conn.set_ex::<_, _, ()>(key, value, seconds)
                    .await
                    .map_err(map_redis_error)?;
            }
            None => {
                conn.set::<_, _, ()>(key, value)
                    .await
                    .map_err(map_redis_error)?;
            }
        }

        if is_list_key(key) {
            if let Some(prefix) = extract_prefix_from_key(key) {
                let tracking = tracking_key(prefix);
                conn.sadd::<_, _, ()>(&tracking, key)
                    .await
                    .map_err(map_redis_error)?;
                extend_tracking(&mut conn, &tracking, ttl).await?;
            }
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();

        if is_list_key(key) {
            if let Some(prefix) = extract_prefix_from_key(key) {
                conn.srem::<_, _, ()>(tracking_key(prefix), key)
                    .await
                    .map_err(map_redis_error)?;
            }
        }

        conn.del::<_, ()>(key).await.map_err(map_redis_error)?;

        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<()> {
        let Some(entity) = extract_prefix_from_key(prefix).filter(|_| is_list_key(prefix)) else {
            // Only list pages are tracked.
            tracing::debug!(prefix, "Untracked prefix, nothing to delete");
            return Ok(());
        };

        let mut conn = self.conn.clone();
        let tracking = tracking_key(entity);

        let tracked_keys: Vec<String> = conn.smembers(&tracking).await.map_err(map_redis_error)?;

        let keys_to_delete: Vec<&String> = tracked_keys
            .iter()
            .filter(|k| k.starts_with(prefix))
            .collect();

        let stale = stale_members(&mut conn, &tracked_keys, &keys_to_delete).await?;
        if !stale.is_empty() {
            conn.srem::<_, _, ()>(&tracking, &stale)
                .await
                .map_err(map_redis_error)?;
        }

        if !keys_to_delete.is_empty() {
            conn.del::<_, ()>(&keys_to_delete)
                .await
                .map_err(map_redis_error)?;

            conn.srem::<_, _, ()>(&tracking, &keys_to_delete)
                .await
                .map_err(map_redis_error)?;
        }

        Ok(())
    }
}
