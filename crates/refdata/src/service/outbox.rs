//! Events collected during a command and dispatched after commit.

use refdata_core::aggregate::Aggregate;
use refdata_core::events::{DomainEvent, EventDispatcher, EventEnvelope};

/// Buffer of envelopes released only once the write is committed.
///
/// Delivery is best-effort: failures are logged and never reach the caller.
#[derive(Debug, Default)]
pub struct Outbox {
    envelopes: Vec<EventEnvelope>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes and buffers `events`.
    pub fn record<A: Aggregate>(&mut self, events: &[DomainEvent<A>]) {
        for event in events {
            match event.to_envelope() {
                Ok(envelope) => self.envelopes.push(envelope),
                Err(err) => {
                    tracing::warn!(
                        entity = A::ENTITY,
                        id = %event.state.id(),
                        error = %err,
                        "Failed to serialize event"
                    );
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.envelopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.envelopes.is_empty()
    }

    /// Hands every buffered envelope to `dispatcher`.
    pub async fn flush(self, dispatcher: &dyn EventDispatcher) {
        if self.envelopes.is_empty() {
            return;
        }

        if let Err(err) = dispatcher.dispatch(&self.envelopes).await {
            tracing::warn!(
                count = self.envelopes.len(),
                error = %err,
                "Failed to dispatch events"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use refdata_core::events::{DispatchError, EventKind, Result as DispatchResult};
    use refdata_core::geography::{Currency, CurrencyDraft};
    use refdata_core::id::CurrencyId;

    #[derive(Default)]
    struct Recording {
        seen: Mutex<Vec<EventEnvelope>>,
    }

    #[async_trait]
    impl EventDispatcher for Recording {
        async fn dispatch(&self, events: &[EventEnvelope]) -> DispatchResult<()> {
            self.seen.lock().unwrap().extend_from_slice(events);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventDispatcher for Failing {
        async fn dispatch(&self, _events: &[EventEnvelope]) -> DispatchResult<()> {
            Err(DispatchError::PublishFailed("broker down".to_string()))
        }
    }

    fn created() -> DomainEvent<Currency> {
        let currency = Currency::from_draft(
            CurrencyId::new(),
            CurrencyDraft {
                code: "XOF".to_string(),
                name: "West African CFA franc".to_string(),
                symbol: None,
                decimals: 0,
            },
        );
        DomainEvent::new(EventKind::Created, currency)
    }

    #[tokio::test]
    async fn test_flush_dispatches_recorded_events() {
        let mut outbox = Outbox::new();
        outbox.record(&[created(), created()]);
        assert_eq!(outbox.len(), 2);

        let dispatcher = Recording::default();
        outbox.flush(&dispatcher).await;

        let seen = dispatcher.seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].entity, "currency");
        assert_eq!(seen[0].kind, EventKind::Created);
    }

    #[tokio::test]
    async fn test_empty_outbox_does_not_dispatch() {
        let dispatcher = Failing;
        Outbox::new().flush(&dispatcher).await;
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_swallowed() {
        let mut outbox = Outbox::new();
        outbox.record(&[created()]);
        outbox.flush(&Failing).await;
    }
}
