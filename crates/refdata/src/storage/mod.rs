//! Storage backend implementations.
//!
//! This module provides the concrete implementations of the
//! `refdata_core::storage::Repository` trait:
//!
//! - [`inmemory`]: the backing store, with staged writes and eager loading
//! - [`cached`]: the cache-aside decorator wrapping any repository

pub mod cached;
pub mod inmemory;

pub use cached::CachedRepository;
pub use inmemory::{ChildLoader, InMemoryRepository, NavigationLoader};
