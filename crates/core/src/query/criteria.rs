use crate::aggregate::Aggregate;
use crate::cache::list_key;

use super::{Page, Predicate, PredicateBuilder};

/// A closed, per-aggregate filter and pagination request.
///
/// Implementors only describe their own optional filters. The implicit
/// status clause and the page normalization are applied here so that no
/// aggregate can forget them.
pub trait Criteria: Send + Sync {
    type Entity: Aggregate;

    /// Requested page number (1-indexed, 0 means default).
    fn page_number(&self) -> u32;

    /// Requested page size (0 means default).
    fn page_size(&self) -> u32;

    /// Explicit status filter, if any.
    fn is_enabled(&self) -> Option<bool>;

    /// Adds one clause per provided filter field.
    fn filters(
        &self,
        builder: PredicateBuilder<Self::Entity>,
    ) -> PredicateBuilder<Self::Entity>;

    /// The normalized page request.
    fn page(&self) -> Page {
        Page::new(self.page_number(), self.page_size())
    }

    /// The effective predicate, including the status clause.
    fn predicate(&self) -> Predicate<Self::Entity> {
        self.filters(PredicateBuilder::new())
            .enabled(self.is_enabled())
            .build()
    }

    /// Cache key for this request with the given eager-loaded paths.
    fn cache_key(&self, includes: &[&str]) -> String {
        list_key(
            <Self::Entity as Aggregate>::CACHE_PREFIX,
            &self.predicate(),
            self.page(),
            includes,
        )
    }
}
