use std::{env, time::Duration};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// TTL of cached single-entity lookups in seconds (default: 600)
    pub cache_ttl_seconds: u64,
    /// TTL of cached list pages in seconds (default: 300)
    pub cache_list_ttl_seconds: u64,
    /// Maximum number of cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Capacity of each per-entity event channel (default: 256)
    pub event_channel_capacity: usize,
    /// Dependents named per link in a dependency conflict (default: 10)
    pub dependent_preview_limit: u32,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `redis` feature is enabled.
    #[allow(dead_code)]
    pub redis_url: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CACHE_TTL_SECONDS` - Point lookup TTL in seconds (default: 600)
    /// - `CACHE_LIST_TTL_SECONDS` - List page TTL in seconds (default: 300)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    /// - `EVENT_CHANNEL_CAPACITY` - Per-entity event channel capacity (default: 256)
    /// - `DEPENDENT_PREVIEW_LIMIT` - Dependents listed per link on conflict (default: 10)
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    pub fn from_env() -> Self {
        Self {
            cache_ttl_seconds: parse_env("CACHE_TTL_SECONDS", 600),
            cache_list_ttl_seconds: parse_env("CACHE_LIST_TTL_SECONDS", 300),
            cache_max_entries: parse_env("CACHE_MAX_ENTRIES", 10_000),
            event_channel_capacity: parse_env("EVENT_CHANNEL_CAPACITY", 256),
            dependent_preview_limit: parse_env("DEPENDENT_PREVIEW_LIMIT", 10),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
        }
    }

    /// Get the point lookup TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    /// Get the list page TTL as a Duration.
    pub fn cache_list_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_list_ttl_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
