//! Event bus implementation
//!
//! This module provides the event bus abstraction and an in-memory
//! implementation for publishing and subscribing to catalog events.

use crate::types::Event;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error};

/// Event bus error types.
#[derive(Debug, Error)]
pub enum EventBusError {
    /// Failed to publish event
    #[error("Failed to publish event: {0}")]
    PublishError(String),

    /// Failed to subscribe
    #[error("Failed to subscribe: {0}")]
    SubscribeError(String),

    /// Handler failed while processing an event
    #[error("Handler error: {0}")]
    HandlerError(String),

    /// Unknown subscription id
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(String),

    /// Channel closed
    #[error("Channel closed")]
    ChannelClosed,
}

/// Result type for event bus operations.
pub type EventBusResult<T> = Result<T, EventBusError>;

/// Subscription handle for receiving events.
pub struct Subscription {
    /// Subscription ID
    pub id: String,
    /// Topic pattern
    pub topic: String,
    /// Event receiver
    pub receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Receive the next event.
    pub async fn recv(&mut self) -> EventBusResult<Event> {
        self.receiver
            .recv()
            .await
            .map_err(|_| EventBusError::ChannelClosed)
    }

    /// Receive an already-published event without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}

/// Event handler trait for processing events.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handle an event.
    async fn handle(&self, event: Event) -> EventBusResult<()>;

    /// Get the topic patterns this handler is interested in.
    fn topics(&self) -> Vec<String>;
}

/// Event bus trait for publish/subscribe operations.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event.
    async fn publish(&self, event: Event) -> EventBusResult<()>;

    /// Subscribe to a topic pattern.
    ///
    /// Topic patterns support wildcards:
    /// - `*` matches any single segment
    /// - `#` matches zero or more segments
    ///
    /// Examples:
    /// - `catalog.resource.*` matches `catalog.resource.forked`, `catalog.resource.validated`
    /// - `#.validated` matches any source's validated events
    async fn subscribe(&self, topic: &str) -> EventBusResult<Subscription>;

    /// Register an event handler.
    async fn register_handler(&self, handler: Arc<dyn EventHandler>) -> EventBusResult<()>;

    /// Drop a subscription.
    async fn unsubscribe(&self, subscription_id: &str) -> EventBusResult<()>;

    /// Get event bus stats.
    async fn stats(&self) -> EventBusStats;
}

/// Event bus statistics.
#[derive(Debug, Clone, Default)]
pub struct EventBusStats {
    /// Total events published
    pub events_published: u64,
    /// Total deliveries to subscribers and handlers
    pub events_delivered: u64,
    /// Handler invocations that returned an error
    pub handler_failures: u64,
    /// Active subscriptions
    pub active_subscriptions: usize,
    /// Registered handlers
    pub registered_handlers: usize,
}

/// In-memory event bus implementation.
///
/// Subscribers receive events through broadcast channels. Handlers run
/// inline, in registration order, before `publish` returns; a failing
/// handler is logged and does not stop the others.
pub struct MemoryEventBus {
    /// Topic pattern -> broadcast sender
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<Event>>>>,
    /// Subscription id -> topic pattern
    subscriptions: Arc<RwLock<HashMap<String, String>>>,
    /// Registered handlers
    handlers: Arc<RwLock<Vec<Arc<dyn EventHandler>>>>,
    /// Statistics
    stats: Arc<RwLock<EventBusStats>>,
    /// Default channel capacity
    channel_capacity: usize,
}

impl std::fmt::Debug for MemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEventBus")
            .field("channel_capacity", &self.channel_capacity)
            .finish()
    }
}

impl MemoryEventBus {
    /// Create a new in-memory event bus.
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Create with custom channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            handlers: Arc::new(RwLock::new(Vec::new())),
            stats: Arc::new(RwLock::new(EventBusStats::default())),
            channel_capacity: capacity.max(1),
        }
    }

    /// Check if a topic matches a pattern.
    pub fn topic_matches(pattern: &str, topic: &str) -> bool {
        let pattern_parts: Vec<&str> = pattern.split('.').collect();
        let topic_parts: Vec<&str> = topic.split('.').collect();
        Self::segments_match(&pattern_parts, &topic_parts)
    }

    fn segments_match(pattern: &[&str], topic: &[&str]) -> bool {
        match pattern.split_first() {
            None => topic.is_empty(),
            Some((&"#", rest)) => (0..=topic.len()).any(|skip| Self::segments_match(rest, &topic[skip..])),
            Some((&"*", rest)) => !topic.is_empty() && Self::segments_match(rest, &topic[1..]),
            Some((segment, rest)) => {
                topic.first() == Some(segment) && Self::segments_match(rest, &topic[1..])
            }
        }
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, event: Event) -> EventBusResult<()> {
        let topic = event.topic();
        let mut delivered = 0u64;
        let mut failures = 0u64;

        {
            let channels = self.channels.read().await;
            for (pattern, sender) in channels.iter() {
                if Self::topic_matches(pattern, &topic) && sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }

        // Snapshot so handlers may publish or register without deadlocking
        let handlers: Vec<Arc<dyn EventHandler>> = self.handlers.read().await.clone();
        for handler in handlers {
            let interested = handler
                .topics()
                .iter()
                .any(|pattern| Self::topic_matches(pattern, &topic));
            if !interested {
                continue;
            }

            match handler.handle(event.clone()).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    failures += 1;
                    error!(topic = %topic, event_id = %event.id, error = %e, "Handler error");
                }
            }
        }

        {
            let mut stats = self.stats.write().await;
            stats.events_published += 1;
            stats.events_delivered += delivered;
            stats.handler_failures += failures;
        }

        debug!(topic = %topic, event_id = %event.id, delivered, "Event published");
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> EventBusResult<Subscription> {
        if topic.is_empty() {
            return Err(EventBusError::SubscribeError("empty topic pattern".to_string()));
        }

        let id = uuid::Uuid::now_v7().to_string();

        let receiver = {
            let mut channels = self.channels.write().await;

            if let Some(sender) = channels.get(topic) {
                sender.subscribe()
            } else {
                let (sender, receiver) = broadcast::channel(self.channel_capacity);
                channels.insert(topic.to_string(), sender);
                receiver
            }
        };

        self.subscriptions
            .write()
            .await
            .insert(id.clone(), topic.to_string());

        {
            let mut stats = self.stats.write().await;
            stats.active_subscriptions += 1;
        }

        Ok(Subscription {
            id,
            topic: topic.to_string(),
            receiver,
        })
    }

    async fn register_handler(&self, handler: Arc<dyn EventHandler>) -> EventBusResult<()> {
        let mut handlers = self.handlers.write().await;
        handlers.push(handler);

        {
            let mut stats = self.stats.write().await;
            stats.registered_handlers = handlers.len();
        }

        Ok(())
    }

    async fn unsubscribe(&self, subscription_id: &str) -> EventBusResult<()> {
        let mut subscriptions = self.subscriptions.write().await;
        let pattern = subscriptions
            .remove(subscription_id)
            .ok_or_else(|| EventBusError::SubscriptionNotFound(subscription_id.to_string()))?;

        // Drop the channel once nobody subscribes to its pattern
        if !subscriptions.values().any(|p| *p == pattern) {
            self.channels.write().await.remove(&pattern);
        }

        {
            let mut stats = self.stats.write().await;
            stats.active_subscriptions = subscriptions.len();
        }

        Ok(())
    }

    async fn stats(&self) -> EventBusStats {
        self.stats.read().await.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
