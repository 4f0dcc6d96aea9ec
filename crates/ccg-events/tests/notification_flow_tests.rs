//! Integration tests for catalog events flowing into the notification feed.
//!
//! A `NotificationDispatcher` is registered on a `MemoryEventBus`; catalog
//! events are published as envelopes and the resulting feed is inspected.

use std::sync::Arc;

use async_trait::async_trait;
use ccg_events::{
    CatalogEvent, Event, EventBus, EventBusError, EventBusResult, EventHandler, MemoryEventBus,
    NotificationDispatcher, NotificationError, NotificationFeed, NotificationType,
};
use chrono::Utc;
use uuid::Uuid;

/// Bus with a dispatcher writing into a shared feed.
struct Harness {
    bus: MemoryEventBus,
    feed: Arc<NotificationFeed>,
}

impl Harness {
    async fn new(admins: Vec<Uuid>) -> Self {
        let bus = MemoryEventBus::new();
        let feed = Arc::new(NotificationFeed::new());
        let dispatcher = NotificationDispatcher::new(feed.clone()).with_admins(admins);
        bus.register_handler(Arc::new(dispatcher)).await.unwrap();
        Self { bus, feed }
    }

    async fn publish(&self, event: CatalogEvent) {
        self.bus.publish(event.to_event()).await.unwrap();
    }
}

/// Handler that always fails, to check failures stay contained.
struct Exploding;

#[async_trait]
impl EventHandler for Exploding {
    async fn handle(&self, _event: Event) -> EventBusResult<()> {
        Err(EventBusError::HandlerError("boom".to_string()))
    }

    fn topics(&self) -> Vec<String> {
        vec!["#".to_string()]
    }
}

#[tokio::test]
async fn test_validation_request_reaches_every_admin_but_requester() {
    let alice = Uuid::now_v7();
    let bob = Uuid::now_v7();
    let harness = Harness::new(vec![alice, bob]).await;

    harness
        .publish(CatalogEvent::ValidationRequested {
            resource_id: Uuid::now_v7(),
            version_id: Uuid::now_v7(),
            owner_id: bob,
            requested_by: bob,
            title: "Dataset cleaner".to_string(),
        })
        .await;

    assert_eq!(harness.feed.unread_count(alice).await, 1);
    assert_eq!(harness.feed.unread_count(bob).await, 0);

    let inbox = harness.feed.for_user(alice, true).await;
    assert_eq!(inbox[0].notification_type, NotificationType::ValidationRequested);
    assert_eq!(inbox[0].actor_id, Some(bob));
}

#[tokio::test]
async fn test_read_tracking_across_events() {
    let owner = Uuid::now_v7();
    let harness = Harness::new(Vec::new()).await;
    let resource_id = Uuid::now_v7();

    harness
        .publish(CatalogEvent::ResourceForked {
            source_resource_id: resource_id,
            source_owner_id: owner,
            forked_resource_id: Uuid::now_v7(),
            derived_from_version: Uuid::now_v7(),
            forked_by: Uuid::now_v7(),
            title: "Prompt".to_string(),
        })
        .await;
    harness
        .publish(CatalogEvent::ResourceValidated {
            resource_id,
            version_id: Uuid::now_v7(),
            owner_id: owner,
            validated_by: Uuid::now_v7(),
            title: "Prompt".to_string(),
            validated_at: Utc::now(),
        })
        .await;

    let inbox = harness.feed.for_user(owner, false).await;
    assert_eq!(inbox.len(), 2);
    assert_eq!(inbox[0].notification_type, NotificationType::ResourceValidated);

    let stranger = Uuid::now_v7();
    let err = harness.feed.mark_as_read(inbox[0].id, stranger).await.unwrap_err();
    assert!(matches!(err, NotificationError::NotFound(_)));
    assert_eq!(err.status_code(), 404);

    harness.feed.mark_as_read(inbox[0].id, owner).await.unwrap();
    assert_eq!(harness.feed.unread_count(owner).await, 1);
    assert_eq!(harness.feed.mark_all_as_read(owner).await, 1);
    assert_eq!(harness.feed.unread_count(owner).await, 0);
}

#[tokio::test]
async fn test_other_events_produce_no_notifications() {
    let owner = Uuid::now_v7();
    let harness = Harness::new(vec![Uuid::now_v7()]).await;

    harness
        .publish(CatalogEvent::ResourceCreated {
            resource_id: Uuid::now_v7(),
            version_id: Uuid::now_v7(),
            owner_id: owner,
            title: "New".to_string(),
        })
        .await;
    harness
        .publish(CatalogEvent::ResourceDeleted {
            resource_id: Uuid::now_v7(),
            deleted_by: owner,
        })
        .await;

    assert!(harness.feed.for_user(owner, false).await.is_empty());
    assert_eq!(harness.bus.stats().await.events_published, 2);
}

#[tokio::test]
async fn test_failing_handler_does_not_block_notifications() {
    let owner = Uuid::now_v7();
    let harness = Harness::new(Vec::new()).await;
    harness.bus.register_handler(Arc::new(Exploding)).await.unwrap();

    harness
        .publish(CatalogEvent::ResourceValidated {
            resource_id: Uuid::now_v7(),
            version_id: Uuid::now_v7(),
            owner_id: owner,
            validated_by: Uuid::now_v7(),
            title: "Prompt".to_string(),
            validated_at: Utc::now(),
        })
        .await;

    assert_eq!(harness.feed.unread_count(owner).await, 1);
    assert_eq!(harness.bus.stats().await.handler_failures, 1);
}

#[tokio::test]
async fn test_wildcard_subscription_sees_catalog_events() {
    let harness = Harness::new(Vec::new()).await;
    let mut all = harness.bus.subscribe("catalog.#").await.unwrap();
    let mut forks = harness.bus.subscribe("catalog.resource.forked").await.unwrap();

    let resource_id = Uuid::now_v7();
    harness
        .publish(CatalogEvent::ResourceDeleted {
            resource_id,
            deleted_by: Uuid::now_v7(),
        })
        .await;

    let event = all.recv().await.unwrap();
    assert_eq!(event.topic(), "catalog.resource.deleted");
    assert_eq!(
        CatalogEvent::from_event(&event).map(|e| e.resource_id()),
        Some(resource_id)
    );
    assert!(forks.try_recv().is_none());
}
