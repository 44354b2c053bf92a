//! Redis event bus.
//!
//! Publishes committed events as JSON on `channel:{entity}` and fans
//! incoming messages out to local broadcast receivers, so every instance
//! sharing the Redis server observes every write.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::AsyncCommands;
use tokio::sync::{broadcast, RwLock};

use refdata_core::cache::event_channel;
use refdata_core::events::{
    DispatchError, EventDispatcher, EventEnvelope, EventSubscriber, Result,
};

use super::error::{map_publish_error, map_subscribe_error};

type Subscriptions = Arc<RwLock<HashMap<String, broadcast::Sender<EventEnvelope>>>>;

/// Redis pub/sub backend for cross-instance event delivery.
pub struct RedisEventBus {
    client: redis::Client,
    subscriptions: Subscriptions,
    capacity: usize,
}

impl RedisEventBus {
    /// Creates a new Redis event bus.
    ///
    /// # Errors
    ///
    /// Returns `DispatchError::SubscribeFailed` if the server cannot be reached.
    pub async fn new(url: &str, capacity: usize) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_subscribe_error)?;

        // Fail fast when the server is unreachable.
        let _ = client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_subscribe_error)?;

        Ok(Self {
            client,
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        })
    }
}

#[async_trait]
impl EventDispatcher for RedisEventBus {
    async fn dispatch(&self, events: &[EventEnvelope]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(map_publish_error)?;

        for event in events {
            let payload = serde_json::to_string(event)
                .map_err(|e| DispatchError::Serialization(e.to_string()))?;
            conn.publish::<_, _, ()>(event_channel(&event.entity), &payload)
                .await
                .map_err(map_publish_error)?;
        }

        Ok(())
    }
}

#[async_trait]
impl EventSubscriber for RedisEventBus {
    /// Returns once the server has confirmed the subscription, so events
    /// dispatched afterwards reach the receiver.
    async fn subscribe(&self, entity: &str) -> Result<broadcast::Receiver<EventEnvelope>> {
        {
            let subscriptions = self.subscriptions.read().await;
            if let Some(sender) = subscriptions.get(entity) {
                return Ok(sender.subscribe());
            }
        }

        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(map_subscribe_error)?;
        pubsub
            .subscribe(event_channel(entity))
            .await
            .map_err(map_subscribe_error)?;

        let (tx, rx) = broadcast::channel(self.capacity);

        {
            let mut subscriptions = self.subscriptions.write().await;
            // Lost the race: the other subscription is already live.
            if let Some(sender) = subscriptions.get(entity) {
                return Ok(sender.subscribe());
            }
            subscriptions.insert(entity.to_string(), tx.clone());
        }

        let entity = entity.to_string();
        let subscriptions = Arc::clone(&self.subscriptions);

        tokio::spawn(async move {
            if let Err(e) = run_subscription_loop(pubsub, &entity, tx).await {
                tracing::error!(entity = %entity, error = %e, "Redis subscription failed");
            }
            subscriptions.write().await.remove(&entity);
        });

        Ok(rx)
    }
}

/// Forwards Redis messages for one entity to its broadcast channel.
async fn run_subscription_loop(
    mut pubsub: redis::aio::PubSub,
    entity: &str,
    tx: broadcast::Sender<EventEnvelope>,
) -> Result<()> {
    let mut stream = pubsub.on_message();

    while let Some(msg) = stream.next().await {
        let payload: String = msg.get_payload().map_err(map_subscribe_error)?;

        match serde_json::from_str::<EventEnvelope>(&payload) {
            Ok(event) => {
                // No receivers left is fine.
                let _ = tx.send(event);
            }
            Err(e) => {
                tracing::warn!(entity, error = %e, "Failed to deserialize event envelope");
            }
        }
    }

    tracing::info!(entity, "Redis subscription stream ended");
    Ok(())
}
