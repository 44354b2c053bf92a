//! Criteria, predicates and pagination.

mod criteria;
mod page;
mod predicate;

pub use criteria::Criteria;
pub use page::{Page, PagedResult, DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use predicate::{
    Accessor, Clause, FilterValue, Operator, Predicate, PredicateBuilder, IS_ENABLED_FIELD,
};
