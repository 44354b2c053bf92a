//! Command and query handlers over the repositories.
//!
//! [`AggregateService`] sequences every command the same way: existence,
//! dependency and uniqueness guards, the pure lifecycle transition,
//! persistence, cache invalidation (inside the cached repository) and
//! finally event dispatch through the [`Outbox`].

mod aggregate;
mod guard;
mod outbox;

pub use aggregate::AggregateService;
pub use guard::{ChildGuard, DependencyGuard};
pub use outbox::Outbox;
