//! Domain events and the dispatch seam.

mod error;
mod traits;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::Aggregate;
use crate::id::EntityId;

pub use error::{DispatchError, Result};
pub use traits::{EventDispatcher, EventSubscriber};

/// What happened to an aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    Patched,
    Disabled,
    Activated,
}

/// A typed event carrying the full resulting state.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvent<A> {
    pub kind: EventKind,
    pub state: A,
    pub occurred_at: DateTime<Utc>,
}

impl<A: Aggregate> DomainEvent<A> {
    pub fn new(kind: EventKind, state: A) -> Self {
        Self {
            kind,
            state,
            occurred_at: Utc::now(),
        }
    }

    /// Erases the aggregate type for transport.
    pub fn to_envelope(&self) -> Result<EventEnvelope> {
        let payload = serde_json::to_value(&self.state)
            .map_err(|e| DispatchError::Serialization(e.to_string()))?;
        Ok(EventEnvelope {
            entity: A::CACHE_PREFIX.to_string(),
            aggregate_id: self.state.id().uuid(),
            kind: self.kind,
            occurred_at: self.occurred_at,
            payload,
        })
    }
}

/// A serialized event as handed to dispatchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Cache prefix of the aggregate type (e.g. `country`).
    pub entity: String,
    pub aggregate_id: Uuid,
    pub kind: EventKind,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

/// The result of a lifecycle transition: the new state and its events.
///
/// A mutation without events is a no-op and must not be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<A> {
    pub aggregate: A,
    pub events: Vec<DomainEvent<A>>,
}

impl<A: Aggregate> Mutation<A> {
    /// A state change producing exactly one event.
    pub fn single(aggregate: A, kind: EventKind) -> Self {
        let event = DomainEvent::new(kind, aggregate.clone());
        Self {
            aggregate,
            events: vec![event],
        }
    }

    pub fn unchanged(aggregate: A) -> Self {
        Self {
            aggregate,
            events: Vec::new(),
        }
    }

    pub fn is_changed(&self) -> bool {
        !self.events.is_empty()
    }
}
