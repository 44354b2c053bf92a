//! Pure core of the refdata service.
//!
//! Identifiers, aggregates and their lifecycle transitions, criteria and
//! predicates, pagination, cache keys, and the storage, cache and event
//! traits implemented by the shell. Nothing here performs I/O.

pub mod aggregate;
pub mod banking;
pub mod cache;
pub mod catalog;
pub mod events;
pub mod geography;
mod http_mapping;
pub mod id;
pub mod organization;
pub mod query;
pub mod serde_ext;
pub mod storage;
pub mod taxation;

pub use http_mapping::{
    lifecycle_error_to_status_code, repository_error_to_status_code, CLIENT_CLOSED_REQUEST,
};
