//! In-memory cache backend implementation.
//!
//! Provides a thread-safe in-memory cache with TTL support and an
//! in-process event bus for single-instance deployments.

mod cache;
mod pubsub;

pub use cache::MemoryCache;
pub use pubsub::{MemoryEventBus, DEFAULT_CHANNEL_CAPACITY};
