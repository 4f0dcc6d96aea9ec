//! Event types for catalog activity
//!
//! This module defines the event envelope and the typed events the catalog
//! publishes when resources change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Source name used for every catalog event.
pub const CATALOG_SOURCE: &str = "catalog";

/// Event envelope.
///
/// All events are wrapped in this envelope which provides metadata
/// for routing, tracing, and processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event ID
    pub id: Uuid,

    /// Event type (e.g., "resource.validated", "resource.forked")
    pub event_type: String,

    /// Source component
    pub source: String,

    /// Timestamp when event was created
    pub timestamp: DateTime<Utc>,

    /// User who triggered the event
    pub user_id: Option<Uuid>,

    /// Resource the event is about
    pub resource_id: Option<Uuid>,

    /// Correlation ID for tracing
    pub correlation_id: Option<String>,

    /// Event version for schema evolution
    pub version: u32,

    /// Event payload
    pub payload: serde_json::Value,

    /// Additional metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Event {
    /// Create a new event.
    pub fn new(event_type: impl Into<String>, source: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type: event_type.into(),
            source: source.into(),
            timestamp: Utc::now(),
            user_id: None,
            resource_id: None,
            correlation_id: None,
            version: 1,
            payload,
            metadata: HashMap::new(),
        }
    }

    /// Set user context.
    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Set resource context.
    pub fn with_resource(mut self, resource_id: Uuid) -> Self {
        self.resource_id = Some(resource_id);
        self
    }

    /// Set correlation ID.
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }

    /// Add metadata.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Get the topic for this event.
    ///
    /// Topics are structured as: `{source}.{event_type}`
    pub fn topic(&self) -> String {
        format!("{}.{}", self.source, self.event_type)
    }

    /// Parse the payload into a specific type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

/// Events published by the resource catalog.
///
/// Every variant names the resource it concerns and carries the ids a
/// notification needs, so consumers never have to read the catalog back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    /// A resource and its initial version were created
    ResourceCreated {
        resource_id: Uuid,
        version_id: Uuid,
        owner_id: Uuid,
        title: String,
    },
    /// A resource was forked into a new resource
    ResourceForked {
        source_resource_id: Uuid,
        source_owner_id: Uuid,
        forked_resource_id: Uuid,
        derived_from_version: Uuid,
        forked_by: Uuid,
        title: String,
    },
    /// The owner asked administrators to review the latest version
    ValidationRequested {
        resource_id: Uuid,
        version_id: Uuid,
        owner_id: Uuid,
        requested_by: Uuid,
        title: String,
    },
    /// An administrator validated the latest version
    ResourceValidated {
        resource_id: Uuid,
        version_id: Uuid,
        owner_id: Uuid,
        validated_by: Uuid,
        title: String,
        validated_at: DateTime<Utc>,
    },
    /// A newer version became the latest
    VersionPublished {
        resource_id: Uuid,
        version_id: Uuid,
        version_number: String,
        owner_id: Uuid,
    },
    /// A resource was soft-deleted
    ResourceDeleted { resource_id: Uuid, deleted_by: Uuid },
}

impl CatalogEvent {
    /// Event type string, without the source prefix.
    pub fn event_type(&self) -> &'static str {
        match self {
            CatalogEvent::ResourceCreated { .. } => "resource.created",
            CatalogEvent::ResourceForked { .. } => "resource.forked",
            CatalogEvent::ValidationRequested { .. } => "resource.validation_requested",
            CatalogEvent::ResourceValidated { .. } => "resource.validated",
            CatalogEvent::VersionPublished { .. } => "resource.version_published",
            CatalogEvent::ResourceDeleted { .. } => "resource.deleted",
        }
    }

    /// The resource the event is about.
    pub fn resource_id(&self) -> Uuid {
        match self {
            CatalogEvent::ResourceCreated { resource_id, .. }
            | CatalogEvent::ValidationRequested { resource_id, .. }
            | CatalogEvent::ResourceValidated { resource_id, .. }
            | CatalogEvent::VersionPublished { resource_id, .. }
            | CatalogEvent::ResourceDeleted { resource_id, .. } => *resource_id,
            CatalogEvent::ResourceForked {
                source_resource_id, ..
            } => *source_resource_id,
        }
    }

    /// The user whose action produced the event.
    pub fn actor_id(&self) -> Uuid {
        match self {
            CatalogEvent::ResourceCreated { owner_id, .. }
            | CatalogEvent::VersionPublished { owner_id, .. } => *owner_id,
            CatalogEvent::ResourceForked { forked_by, .. } => *forked_by,
            CatalogEvent::ValidationRequested { requested_by, .. } => *requested_by,
            CatalogEvent::ResourceValidated { validated_by, .. } => *validated_by,
            CatalogEvent::ResourceDeleted { deleted_by, .. } => *deleted_by,
        }
    }

    /// Convert to generic event.
    pub fn to_event(&self) -> Event {
        let payload = serde_json::to_value(self).unwrap_or_default();
        Event::new(self.event_type(), CATALOG_SOURCE, payload)
            .with_user(self.actor_id())
            .with_resource(self.resource_id())
    }

    /// Recover a typed catalog event from an envelope.
    ///
    /// Returns `None` for events from other sources or with payloads that
    /// do not describe a catalog event.
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.source != CATALOG_SOURCE {
            return None;
        }
        event.parse_payload().ok()
    }
}
