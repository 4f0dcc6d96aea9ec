//! Catalog event publication.

use std::sync::Arc;

use ccg_events::{CatalogEvent, EventBus};
use tracing::{debug, warn};

/// Publishes catalog events after their operation has committed.
///
/// A publish failure is logged and swallowed: the operation that produced
/// the event has already happened.
#[derive(Clone, Default)]
pub struct EventPublisher {
    bus: Option<Arc<dyn EventBus>>,
}

impl EventPublisher {
    /// Publisher that drops every event.
    pub fn disabled() -> Self {
        Self { bus: None }
    }

    /// Publisher backed by `bus`.
    pub fn new(bus: Arc<dyn EventBus>) -> Self {
        Self { bus: Some(bus) }
    }

    /// Check whether a bus is attached.
    pub fn is_enabled(&self) -> bool {
        self.bus.is_some()
    }

    /// Publish an event.
    pub async fn publish(&self, event: CatalogEvent) {
        let Some(bus) = &self.bus else {
            return;
        };

        let envelope = event.to_event();
        let topic = envelope.topic();
        match bus.publish(envelope).await {
            Ok(()) => debug!(%topic, resource_id = %event.resource_id(), "Published catalog event"),
            Err(e) => warn!(%topic, error = %e, "Failed to publish catalog event"),
        }
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
