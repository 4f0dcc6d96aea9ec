//! In-app notifications
//!
//! Users are notified when their resource is validated or forked, and
//! administrators when someone asks for validation. The
//! [`NotificationDispatcher`] subscribes to catalog events and writes those
//! notifications into a [`NotificationFeed`].

use crate::bus::{EventBusError, EventBusResult, EventHandler};
use crate::types::{CatalogEvent, Event};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

/// Notification errors.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The notification does not exist or belongs to another user
    #[error("Notification not found or access denied: {0}")]
    NotFound(Uuid),
}

impl NotificationError {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            NotificationError::NotFound(_) => 404,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            NotificationError::NotFound(_) => "NOTIFICATION_NOT_FOUND",
        }
    }
}

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Kind of notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// Sent to the owner when an admin validates their resource
    ResourceValidated,
    /// Sent to the owner when someone forks their resource
    ResourceForked,
    /// Sent to admins when an owner requests validation
    ValidationRequested,
}

impl NotificationType {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::ResourceValidated => "resource_validated",
            NotificationType::ResourceForked => "resource_forked",
            NotificationType::ValidationRequested => "validation_requested",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationType::ResourceValidated => "Resource Validated",
            NotificationType::ResourceForked => "Resource Forked",
            NotificationType::ValidationRequested => "Validation Requested",
        }
    }
}

/// A single in-app notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    /// Notification ID
    pub id: Uuid,

    /// Recipient
    pub recipient_id: Uuid,

    /// Notification kind
    #[serde(rename = "type")]
    pub notification_type: NotificationType,

    /// Human-readable message
    pub message: String,

    /// Related resource
    pub resource_id: Option<Uuid>,

    /// User who triggered the notification
    pub actor_id: Option<Uuid>,

    /// When the recipient read it
    pub read_at: Option<DateTime<Utc>>,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create an unread notification.
    pub fn new(recipient_id: Uuid, notification_type: NotificationType, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            recipient_id,
            notification_type,
            message: message.into(),
            resource_id: None,
            actor_id: None,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    /// Set the related resource.
    pub fn with_resource(mut self, resource_id: Uuid) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    /// Set the triggering user.
    pub fn with_actor(mut self, actor_id: Uuid) -> Self {
        self.actor_id = Some(actor_id);
        self
    }

    /// Check if the notification has been read.
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// In-memory notification store.
#[derive(Debug, Default)]
pub struct NotificationFeed {
    notifications: RwLock<Vec<Notification>>,
}

impl NotificationFeed {
    /// Create an empty feed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a notification.
    pub async fn create(&self, notification: Notification) -> Notification {
        self.notifications.write().await.push(notification.clone());
        notification
    }

    /// Notifications for a user, newest first.
    pub async fn for_user(&self, user_id: Uuid, unread_only: bool) -> Vec<Notification> {
        let notifications = self.notifications.read().await;
        // Insertion order is creation order
        notifications
            .iter()
            .rev()
            .filter(|n| n.recipient_id == user_id)
            .filter(|n| !unread_only || !n.is_read())
            .cloned()
            .collect()
    }

    /// Mark one notification read. Reading an already-read notification
    /// keeps its original `read_at`.
    pub async fn mark_as_read(&self, notification_id: Uuid, user_id: Uuid) -> NotificationResult<Notification> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.recipient_id == user_id)
            .ok_or(NotificationError::NotFound(notification_id))?;

        if notification.read_at.is_none() {
            notification.read_at = Some(Utc::now());
        }
        Ok(notification.clone())
    }

    /// Mark every unread notification of a user read, returning how many
    /// changed.
    pub async fn mark_all_as_read(&self, user_id: Uuid) -> usize {
        let now = Utc::now();
        let mut notifications = self.notifications.write().await;
        let mut count = 0;
        for notification in notifications
            .iter_mut()
            .filter(|n| n.recipient_id == user_id && n.read_at.is_none())
        {
            notification.read_at = Some(now);
            count += 1;
        }
        count
    }

    /// Count of unread notifications for a user.
    pub async fn unread_count(&self, user_id: Uuid) -> usize {
        self.notifications
            .read()
            .await
            .iter()
            .filter(|n| n.recipient_id == user_id && !n.is_read())
            .count()
    }
}

/// Turns catalog events into notifications.
pub struct NotificationDispatcher {
    feed: Arc<NotificationFeed>,
    admins: Vec<Uuid>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("admins", &self.admins.len())
            .finish()
    }
}

impl NotificationDispatcher {
    /// Create a dispatcher writing into `feed`.
    pub fn new(feed: Arc<NotificationFeed>) -> Self {
        Self {
            feed,
            admins: Vec::new(),
        }
    }

    /// Administrators who receive validation requests.
    pub fn with_admins(mut self, admins: Vec<Uuid>) -> Self {
        self.admins = admins;
        self
    }

    /// Build the notifications a catalog event produces.
    pub fn notifications_for(&self, event: &CatalogEvent) -> Vec<Notification> {
        match event {
            CatalogEvent::ResourceValidated {
                resource_id,
                owner_id,
                validated_by,
                title,
                ..
            } => vec![Notification::new(
                *owner_id,
                NotificationType::ResourceValidated,
                format!("Your resource \"{}\" has been validated", title),
            )
            .with_resource(*resource_id)
            .with_actor(*validated_by)],

            CatalogEvent::ResourceForked {
                source_resource_id,
                source_owner_id,
                forked_by,
                title,
                ..
            } => {
                if source_owner_id == forked_by {
                    return Vec::new();
                }
                vec![Notification::new(
                    *source_owner_id,
                    NotificationType::ResourceForked,
                    format!("Your resource \"{}\" was forked", title),
                )
                .with_resource(*source_resource_id)
                .with_actor(*forked_by)]
            }

            CatalogEvent::ValidationRequested {
                resource_id,
                requested_by,
                title,
                ..
            } => self
                .admins
                .iter()
                .filter(|admin| *admin != requested_by)
                .map(|admin| {
                    Notification::new(
                        *admin,
                        NotificationType::ValidationRequested,
                        format!("Validation requested for \"{}\"", title),
                    )
                    .with_resource(*resource_id)
                    .with_actor(*requested_by)
                })
                .collect(),

            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl EventHandler for NotificationDispatcher {
    async fn handle(&self, event: Event) -> EventBusResult<()> {
        let catalog_event = CatalogEvent::from_event(&event).ok_or_else(|| {
            EventBusError::HandlerError(format!("unrecognised catalog event {}", event.id))
        })?;

        let notifications = self.notifications_for(&catalog_event);
        if notifications.is_empty() {
            debug!(event_type = %event.event_type, "No recipients for event");
            return Ok(());
        }

        for notification in notifications {
            info!(
                recipient_id = %notification.recipient_id,
                notification_type = notification.notification_type.as_str(),
                "Notification created"
            );
            self.feed.create(notification).await;
        }
        Ok(())
    }

    fn topics(&self) -> Vec<String> {
        vec![
            "catalog.resource.validated".to_string(),
            "catalog.resource.forked".to_string(),
            "catalog.resource.validation_requested".to_string(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{EventBus, MemoryEventBus};

    fn forked(owner: Uuid, forker: Uuid) -> CatalogEvent {
        CatalogEvent::ResourceForked {
            source_resource_id: Uuid::now_v7(),
            source_owner_id: owner,
            forked_resource_id: Uuid::now_v7(),
            derived_from_version: Uuid::now_v7(),
            forked_by: forker,
            title: "Agent workflow".to_string(),
        }
    }

    #[tokio::test]
    async fn test_feed_newest_first_and_unread_filter() {
        let feed = NotificationFeed::new();
        let user = Uuid::now_v7();

        let first = feed
            .create(Notification::new(user, NotificationType::ResourceForked, "first"))
            .await;
        let second = feed
            .create(Notification::new(user, NotificationType::ResourceValidated, "second"))
            .await;
        feed.create(Notification::new(Uuid::now_v7(), NotificationType::ResourceForked, "other"))
            .await;

        let all = feed.for_user(user, false).await;
        assert_eq!(all.iter().map(|n| n.id).collect::<Vec<_>>(), vec![second.id, first.id]);

        feed.mark_as_read(first.id, user).await.unwrap();
        let unread = feed.for_user(user, true).await;
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, second.id);
        assert_eq!(feed.unread_count(user).await, 1);
    }

    #[tokio::test]
    async fn test_mark_as_read_is_owner_scoped_and_idempotent() {
        let feed = NotificationFeed::new();
        let user = Uuid::now_v7();
        let n = feed
            .create(Notification::new(user, NotificationType::ResourceValidated, "done"))
            .await;

        let stranger = Uuid::now_v7();
        let result = feed.mark_as_read(n.id, stranger).await;
        assert!(matches!(result, Err(NotificationError::NotFound(id)) if id == n.id));

        let read = feed.mark_as_read(n.id, user).await.unwrap();
        let again = feed.mark_as_read(n.id, user).await.unwrap();
        assert_eq!(read.read_at, again.read_at);
    }

    #[tokio::test]
    async fn test_mark_all_as_read() {
        let feed = NotificationFeed::new();
        let user = Uuid::now_v7();
        for _ in 0..3 {
            feed.create(Notification::new(user, NotificationType::ResourceForked, "fork"))
                .await;
        }

        assert_eq!(feed.mark_all_as_read(user).await, 3);
        assert_eq!(feed.mark_all_as_read(user).await, 0);
        assert_eq!(feed.unread_count(user).await, 0);
    }

    #[test]
    fn test_self_fork_is_silent() {
        let dispatcher = NotificationDispatcher::new(Arc::new(NotificationFeed::new()));
        let user = Uuid::now_v7();
        assert!(dispatcher.notifications_for(&forked(user, user)).is_empty());

        let owner = Uuid::now_v7();
        let notifications = dispatcher.notifications_for(&forked(owner, user));
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].recipient_id, owner);
        assert_eq!(notifications[0].actor_id, Some(user));
    }

    #[test]
    fn test_validation_request_goes_to_every_admin() {
        let admins = vec![Uuid::now_v7(), Uuid::now_v7()];
        let dispatcher =
            NotificationDispatcher::new(Arc::new(NotificationFeed::new())).with_admins(admins.clone());
        let owner = Uuid::now_v7();

        let event = CatalogEvent::ValidationRequested {
            resource_id: Uuid::now_v7(),
            version_id: Uuid::now_v7(),
            owner_id: owner,
            requested_by: owner,
            title: "Dataset".to_string(),
        };
        let recipients: Vec<Uuid> = dispatcher
            .notifications_for(&event)
            .iter()
            .map(|n| n.recipient_id)
            .collect();
        assert_eq!(recipients, admins);
    }

    #[tokio::test]
    async fn test_dispatcher_through_bus() {
        let bus = MemoryEventBus::new();
        let feed = Arc::new(NotificationFeed::new());
        bus.register_handler(Arc::new(NotificationDispatcher::new(feed.clone())))
            .await
            .unwrap();

        let owner = Uuid::now_v7();
        let event = CatalogEvent::ResourceValidated {
            resource_id: Uuid::now_v7(),
            version_id: Uuid::now_v7(),
            owner_id: owner,
            validated_by: Uuid::now_v7(),
            title: "Prompt".to_string(),
            validated_at: Utc::now(),
        };
        bus.publish(event.to_event()).await.unwrap();

        let notifications = feed.for_user(owner, true).await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].notification_type, NotificationType::ResourceValidated);
        assert_eq!(notifications[0].message, "Your resource \"Prompt\" has been validated");
    }

    #[test]
    fn test_notification_serializes_type_field() {
        let n = Notification::new(Uuid::now_v7(), NotificationType::ValidationRequested, "x");
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "validation_requested");
    }
}
