//! Deterministic cache key derivation.
//!
//! Key layout:
//!
//! - point lookups: `{prefix}:id:{uuid}`
//! - list pages: `{prefix}:list:{clauses}:{includes}:p{number}:s{size}`
//!
//! Clause values are percent-encoded, so `:` and `&` inside user input
//! cannot produce a colliding key.

use uuid::Uuid;

use crate::query::{Page, Predicate};

/// Returns the cache key for a single entity.
pub fn entity_key(prefix: &str, id: Uuid) -> String {
    format!("{}:id:{}", prefix, id)
}

/// Returns the prefix shared by every cached page of an entity type.
pub fn list_prefix(prefix: &str) -> String {
    format!("{}:list:", prefix)
}

/// Returns the cache key for one page of a filtered list.
///
/// Include paths are sorted and deduplicated; `-` stands for none.
pub fn list_key<T>(prefix: &str, predicate: &Predicate<T>, page: Page, includes: &[&str]) -> String {
    let mut includes: Vec<&str> = includes.to_vec();
    includes.sort_unstable();
    includes.dedup();
    let includes = if includes.is_empty() {
        "-".to_string()
    } else {
        includes.join(",")
    };
    format!(
        "{}{}:{}:p{}:s{}",
        list_prefix(prefix),
        predicate.key_fragment(),
        includes,
        page.number(),
        page.size()
    )
}

/// Returns the key of the set tracking every cached key of an entity type.
///
/// Lets backends delete by prefix without scanning the whole keyspace.
pub fn tracking_key(prefix: &str) -> String {
    format!("{}:_keys", prefix)
}

/// Returns the pub/sub channel name for an entity type's events.
pub fn event_channel(prefix: &str) -> String {
    format!("channel:{}", prefix)
}

/// Extracts the entity prefix from a cache key.
///
/// # Examples
///
/// ```
/// use refdata_core::cache::extract_prefix_from_key;
///
/// assert_eq!(extract_prefix_from_key("country:list:all:-:p1:s10"), Some("country"));
/// assert_eq!(extract_prefix_from_key("nocolon"), None);
/// ```
pub fn extract_prefix_from_key(key: &str) -> Option<&str> {
    let (prefix, _) = key.split_once(':')?;
    if prefix.is_empty() {
        return None;
    }
    Some(prefix)
}

/// Checks if a cache key belongs to a list page.
pub fn is_list_key(key: &str) -> bool {
    key.split(':').nth(1) == Some("list")
}
