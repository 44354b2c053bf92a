//! Cache backend implementations.
//!
//! This module provides concrete implementations of the cache and event
//! traits defined in `refdata_core`, plus the [`CacheGateway`] the cached
//! repositories go through. The backends are selected at compile time via
//! feature flags.
//!
//! # Feature Flags
//!
//! - `memory` (default): In-memory LRU cache and tokio broadcast event bus
//! - `redis`: Redis cache and Redis pub/sub event bus
//!
//! These features are mutually exclusive - only one cache backend can be
//! enabled at a time.

#[cfg(all(feature = "memory", feature = "redis"))]
compile_error!(
    "Features 'memory' and 'redis' are mutually exclusive. \
    Enable only one cache backend at a time."
);

#[cfg(not(any(feature = "memory", feature = "redis")))]
compile_error!(
    "No cache backend selected. Enable 'memory' or 'redis' feature. \
    Example: cargo build -p refdata --features memory"
);

mod gateway;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis_impl;

pub use gateway::CacheGateway;

#[cfg(feature = "memory")]
pub use memory::{MemoryCache, MemoryEventBus};

#[cfg(feature = "redis")]
pub use redis_impl::{RedisCache, RedisEventBus};
