//! In-memory storage backend.
//!
//! Used by the CLI and the tests. Data is not persisted.

mod navigation;
mod repository;

pub use navigation::{ChildLoader, NavigationLoader};
pub use repository::InMemoryRepository;
