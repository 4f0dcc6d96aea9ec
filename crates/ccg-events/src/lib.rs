//! # Commons Events
//!
//! This crate carries catalog activity to the rest of the content commons:
//! an event envelope, the typed catalog events, an in-memory event bus, and
//! the in-app notification feed fed by that bus.
//!
//! ## Overview
//!
//! The ccg-events crate handles:
//! - **Event Types**: The `Event` envelope and `CatalogEvent`
//! - **Event Bus**: Publish/subscribe messaging with topic wildcards
//! - **Event Handlers**: Async processing of published events
//! - **Notifications**: Per-user feed with read tracking
//!
//! ## Usage
//!
//! ### Publishing Events
//!
//! ```rust,no_run
//! use ccg_events::{CatalogEvent, EventBus, MemoryEventBus};
//! use uuid::Uuid;
//!
//! async fn publish_example() {
//!     let bus = MemoryEventBus::new();
//!
//!     let event = CatalogEvent::ResourceDeleted {
//!         resource_id: Uuid::now_v7(),
//!         deleted_by: Uuid::now_v7(),
//!     };
//!
//!     bus.publish(event.to_event()).await.unwrap();
//! }
//! ```
//!
//! ### Notifications
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ccg_events::{EventBus, MemoryEventBus, NotificationDispatcher, NotificationFeed};
//! use uuid::Uuid;
//!
//! async fn notify_example(admin: Uuid) {
//!     let bus = MemoryEventBus::new();
//!     let feed = Arc::new(NotificationFeed::new());
//!
//!     let dispatcher = NotificationDispatcher::new(feed.clone()).with_admins(vec![admin]);
//!     bus.register_handler(Arc::new(dispatcher)).await.unwrap();
//!
//!     // ... catalog operations publish to `bus` ...
//!
//!     let unread = feed.unread_count(admin).await;
//!     println!("{unread} unread");
//! }
//! ```
//!
//! ## Topic Patterns
//!
//! Topics are structured as `{source}.{event_type}`:
//! - `catalog.resource.validated` - Specific event
//! - `catalog.resource.*` - All resource events
//! - `#` - All events
//!
//! Wildcards:
//! - `*` matches exactly one segment
//! - `#` matches zero or more segments

pub mod bus;
pub mod notifications;
pub mod types;

// Re-export main types
pub use bus::{EventBus, EventBusError, EventBusResult, EventBusStats, EventHandler, MemoryEventBus, Subscription};
pub use notifications::{
    Notification, NotificationDispatcher, NotificationError, NotificationFeed, NotificationResult,
    NotificationType,
};
pub use types::{CatalogEvent, Event, CATALOG_SOURCE};
