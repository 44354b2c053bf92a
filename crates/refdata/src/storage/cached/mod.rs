//! Cached repository decorator.
//!
//! Wraps any `Repository<T>` with the cache-aside pattern:
//!
//! - **Reads**: check the cache first; on a miss fetch from the repository
//!   and populate the cache
//! - **Writes**: commit to the repository, then invalidate the point keys
//!   of the written entities and every list page that may embed them
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let store = Arc::new(InMemoryRepository::<Country>::new());
//! let cache = CacheGateway::new(
//!     Arc::new(MemoryCache::new(10_000)),
//!     Duration::from_secs(600),
//!     Duration::from_secs(300),
//! );
//!
//! let countries = CachedRepository::new(store, cache);
//! ```

mod repository;

pub use repository::CachedRepository;
