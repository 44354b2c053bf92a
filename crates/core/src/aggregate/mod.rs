//! The aggregate abstraction shared by every reference-data entity.
//!
//! An aggregate is never physically deleted. Its [`Status`] can only be
//! flipped by the [`lifecycle`] transitions, which are pure functions
//! returning the resulting state together with the events it produced.

mod dependents;
mod error;
pub mod lifecycle;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::id::EntityId;
use crate::query::{FilterValue, Predicate, PredicateBuilder};

pub use dependents::{DependentLink, DependentSummary};
pub use error::LifecycleError;

/// Soft-delete flag. New aggregates start enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status {
    enabled: bool,
}

impl Status {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl Default for Status {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// A reference-data entity with an identity, a natural key and a status.
pub trait Aggregate:
    Clone + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    type Id: EntityId;
    /// Every mutable field, used by create and full update.
    type Draft: Send + 'static;
    /// Optional fields, used by partial update.
    type Patch: Send + 'static;

    /// Display name used in errors and events.
    const ENTITY: &'static str;
    /// Prefix for cache keys and event channels.
    const CACHE_PREFIX: &'static str;
    /// Name of the natural-key field.
    const NATURAL_KEY: &'static str;
    /// Cache prefixes of parents whose eager-loaded pages may embed this entity.
    const PARENT_PREFIXES: &'static [&'static str] = &[];

    fn id(&self) -> Self::Id;

    fn natural_key(&self) -> &str;

    fn status(&self) -> Status;

    fn status_mut(&mut self) -> &mut Status;

    /// Rejects drafts that no state may hold. Runs before create and update.
    fn validate_draft(_draft: &Self::Draft) -> Result<(), LifecycleError> {
        Ok(())
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self;

    /// Replaces every mutable field. Identity and status are kept.
    fn replace(&mut self, draft: Self::Draft);

    /// Applies the provided fields. Absent fields are left untouched.
    fn apply_patch(&mut self, patch: Self::Patch) -> Result<(), LifecycleError>;

    /// Drops eager-loaded navigations before the entity is stored.
    fn detach(&mut self) {}

    fn is_enabled(&self) -> bool {
        self.status().is_enabled()
    }
}

/// Matches entities whose natural key equals `key`, whatever their status.
pub fn natural_key_predicate<A: Aggregate>(key: &str) -> Predicate<A> {
    PredicateBuilder::new()
        .eq(A::NATURAL_KEY, Some(key), |entity: &A| {
            Some(FilterValue::from(entity.natural_key()))
        })
        .build()
}

/// Applies an optional text field from a patch, rejecting blank values.
pub fn patch_text(
    field: &'static str,
    target: &mut String,
    value: Option<String>,
) -> Result<(), LifecycleError> {
    if let Some(value) = value {
        if value.trim().is_empty() {
            return Err(LifecycleError::Validation {
                field,
                reason: "must not be empty".to_string(),
            });
        }
        *target = value;
    }
    Ok(())
}

/// Applies a nullable text field from a patch.
///
/// `Some(None)` and a blank value both clear the field.
pub fn patch_optional_text(target: &mut Option<String>, value: Option<Option<String>>) {
    if let Some(value) = value {
        *target = value.filter(|v| !v.trim().is_empty());
    }
}

/// Applies an optional value from a patch.
pub fn patch_value<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
