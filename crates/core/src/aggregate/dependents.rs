use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;

use crate::query::{Accessor, PagedResult, Predicate, PredicateBuilder};

use super::Aggregate;

/// A named child collection whose live members block disabling the parent.
pub struct DependentLink<P, C> {
    /// Navigation path, also used as the eager-load include name.
    pub name: &'static str,
    /// Field on the child that references the parent.
    pub foreign_key: &'static str,
    key_of: Accessor<C>,
    attach: fn(&mut P, Vec<C>),
    _parent: PhantomData<fn() -> P>,
}

impl<P, C> DependentLink<P, C> {
    pub const fn new(
        name: &'static str,
        foreign_key: &'static str,
        key_of: Accessor<C>,
        attach: fn(&mut P, Vec<C>),
    ) -> Self {
        Self {
            name,
            foreign_key,
            key_of,
            attach,
            _parent: PhantomData,
        }
    }
}

impl<P: Aggregate, C: Aggregate> DependentLink<P, C> {
    /// Children referencing `parent`, whatever their status.
    pub fn children(&self, parent: P::Id) -> Predicate<C> {
        PredicateBuilder::new()
            .eq(self.foreign_key, Some(parent), self.key_of)
            .build()
    }

    /// Enabled children referencing `parent`.
    pub fn live_children(&self, parent: P::Id) -> Predicate<C> {
        PredicateBuilder::new()
            .eq(self.foreign_key, Some(parent), self.key_of)
            .enabled(Some(true))
            .build()
    }

    /// Fills the parent's navigation collection.
    pub fn attach(&self, parent: &mut P, children: Vec<C>) {
        (self.attach)(parent, children)
    }

    /// Describes a page of blocking children.
    pub fn summarize(&self, page: &PagedResult<C>) -> DependentSummary {
        DependentSummary {
            link: self.name,
            entity: C::ENTITY,
            total: page.total_count,
            keys: page
                .items
                .iter()
                .map(|child| child.natural_key().to_string())
                .collect(),
        }
    }
}

impl<P, C> Clone for DependentLink<P, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, C> Copy for DependentLink<P, C> {}

impl<P, C> fmt::Debug for DependentLink<P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependentLink")
            .field("name", &self.name)
            .field("foreign_key", &self.foreign_key)
            .finish()
    }
}

/// Live dependents found through one link.
///
/// `keys` holds at most the preview limit of natural keys; `total` is the
/// full count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependentSummary {
    pub link: &'static str,
    pub entity: &'static str,
    pub total: u64,
    pub keys: Vec<String>,
}

impl fmt::Display for DependentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} via {} ({})",
            self.total,
            self.entity,
            self.link,
            self.keys.join(", ")
        )?;
        if (self.keys.len() as u64) < self.total {
            write!(f, " and {} more", self.total - self.keys.len() as u64)?;
        }
        Ok(())
    }
}
