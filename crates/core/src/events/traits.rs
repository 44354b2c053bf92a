use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{EventEnvelope, Result};

/// Receives the events of a committed mutation.
#[async_trait]
pub trait EventDispatcher: Send + Sync {
    /// Delivers the events, in order. Called only after a successful commit.
    async fn dispatch(&self, events: &[EventEnvelope]) -> Result<()>;
}

/// Subscription side of an event transport.
#[async_trait]
pub trait EventSubscriber: Send + Sync {
    /// Subscribes to the events of one aggregate type, by cache prefix.
    async fn subscribe(&self, entity: &str) -> Result<broadcast::Receiver<EventEnvelope>>;
}
