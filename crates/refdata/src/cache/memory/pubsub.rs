//! In-memory event bus.
//!
//! Delivers committed domain events to in-process subscribers through
//! tokio broadcast channels, one channel per entity type.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, RwLock};

use refdata_core::events::{EventDispatcher, EventEnvelope, EventSubscriber, Result};

/// Default capacity of each per-entity channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// In-memory event bus keyed by entity cache prefix.
#[derive(Debug, Clone)]
pub struct MemoryEventBus {
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<EventEnvelope>>>>,
    capacity: usize,
}

impl MemoryEventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    async fn get_or_create_channel(&self, entity: &str) -> broadcast::Sender<EventEnvelope> {
        {
            let channels = self.channels.read().await;
            if let Some(sender) = channels.get(entity) {
                return sender.clone();
            }
        }

        let mut channels = self.channels.write().await;

        // Another task may have created it while we waited for the write lock.
        if let Some(sender) = channels.get(entity) {
            return sender.clone();
        }

        let (sender, _) = broadcast::channel(self.capacity);
        channels.insert(entity.to_string(), sender.clone());
        sender
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

#[async_trait]
impl EventDispatcher for MemoryEventBus {
    async fn dispatch(&self, events: &[EventEnvelope]) -> Result<()> {
        for event in events {
            let sender = self.get_or_create_channel(&event.entity).await;
            // No receivers just means nobody is listening to this entity.
            let _ = sender.send(event.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl EventSubscriber for MemoryEventBus {
    async fn subscribe(&self, entity: &str) -> Result<broadcast::Receiver<EventEnvelope>> {
        let sender = self.get_or_create_channel(entity).await;
        Ok(sender.subscribe())
    }
}
