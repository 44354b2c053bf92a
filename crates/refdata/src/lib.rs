//! Reference-data service shell.
//!
//! Wires the pure `refdata_core` logic to concrete backends: the in-memory
//! store, the cache-aside decorator, the memory or Redis cache and event
//! transports, and the per-aggregate services.

pub mod cache;
pub mod config;
pub mod error;
pub mod seed;
pub mod service;
pub mod state;
pub mod storage;

pub use config::Config;
pub use error::{ServiceError, StartupError};
pub use state::AppState;
