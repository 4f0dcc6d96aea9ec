//! Resource aggregate
//!
//! A [`Resource`] is the container for a chain of [`ResourceVersion`]s.
//! It carries ownership, lineage, and the denormalized fork counter; all
//! descriptive metadata lives on the versions.
//!
//! [`ResourceVersion`]: crate::version::ResourceVersion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use uuid::Uuid;

use crate::version::VersionFields;

/// Where a resource's content comes from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum SourceType {
    /// Content is stored in the catalog (default)
    #[default]
    Internal,
    /// Content lives in a linked repository
    #[serde(rename = "GitHub-Linked")]
    GitHubLinked,
}

impl SourceType {
    /// Get the display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Internal => "Internal",
            SourceType::GitHubLinked => "GitHub-Linked",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "internal" => Some(SourceType::Internal),
            "github-linked" | "github_linked" | "github" => Some(SourceType::GitHubLinked),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog entry owning a chain of versions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// Resource ID
    pub id: Uuid,

    /// Owning user
    pub owner_id: Uuid,

    /// Content source
    pub source_type: SourceType,

    /// Fork parent, if this resource is a fork
    pub derived_from_resource: Option<Uuid>,

    /// The parent's version this fork was copied from
    pub derived_from_version: Option<Uuid>,

    /// Number of direct forks
    pub forks_count: u64,

    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,

    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

impl Resource {
    /// Create a new original resource.
    pub fn new(owner_id: Uuid, source_type: SourceType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            owner_id,
            source_type,
            derived_from_resource: None,
            derived_from_version: None,
            forks_count: 0,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create an Internal resource forked from `parent_id` at `version_id`.
    pub fn fork_of(owner_id: Uuid, parent_id: Uuid, version_id: Uuid) -> Self {
        Self {
            derived_from_resource: Some(parent_id),
            derived_from_version: Some(version_id),
            ..Self::new(owner_id, SourceType::Internal)
        }
    }

    /// Check if the resource is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Check if the resource was forked from another.
    pub fn is_fork(&self) -> bool {
        self.derived_from_resource.is_some()
    }

    /// Check if `user_id` owns the resource.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }
}

/// A resource that was not soft-deleted when it was read.
///
/// Only the store's read paths construct this, so any operation taking a
/// `LiveResource` has already passed the soft-delete filter.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveResource(Resource);

impl LiveResource {
    /// Wrap a resource known to be visible.
    pub(crate) fn new(resource: Resource) -> Option<Self> {
        if resource.is_deleted() {
            None
        } else {
            Some(Self(resource))
        }
    }

    /// Unwrap into the plain resource.
    pub fn into_inner(self) -> Resource {
        self.0
    }
}

impl Deref for LiveResource {
    type Target = Resource;

    fn deref(&self) -> &Resource {
        &self.0
    }
}

/// Request to create a resource with its initial version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewResource {
    /// Content source
    #[serde(default)]
    pub source_type: SourceType,

    /// Fields of version 1.0.0
    #[serde(flatten)]
    pub fields: VersionFields,
}

impl NewResource {
    /// Internal resource request.
    pub fn internal(fields: VersionFields) -> Self {
        Self {
            source_type: SourceType::Internal,
            fields,
        }
    }

    /// GitHub-Linked resource request.
    pub fn github_linked(fields: VersionFields) -> Self {
        Self {
            source_type: SourceType::GitHubLinked,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::ResourceType;

    #[test]
    fn test_source_type_serde() {
        assert_eq!(
            serde_json::to_string(&SourceType::GitHubLinked).unwrap(),
            "\"GitHub-Linked\""
        );
        let parsed: SourceType = serde_json::from_str("\"Internal\"").unwrap();
        assert_eq!(parsed, SourceType::Internal);
        assert_eq!(SourceType::parse("github-linked"), Some(SourceType::GitHubLinked));
        assert_eq!(SourceType::parse("gitlab"), None);
    }

    #[test]
    fn test_fork_of_is_internal_with_lineage() {
        let owner = Uuid::now_v7();
        let parent = Uuid::now_v7();
        let version = Uuid::now_v7();

        let fork = Resource::fork_of(owner, parent, version);
        assert_eq!(fork.source_type, SourceType::Internal);
        assert_eq!(fork.derived_from_resource, Some(parent));
        assert_eq!(fork.derived_from_version, Some(version));
        assert_eq!(fork.forks_count, 0);
        assert!(fork.is_fork());
        assert!(fork.is_owned_by(owner));
    }

    #[test]
    fn test_live_resource_rejects_deleted() {
        let mut resource = Resource::new(Uuid::now_v7(), SourceType::Internal);
        assert!(LiveResource::new(resource.clone()).is_some());

        resource.deleted_at = Some(Utc::now());
        assert!(LiveResource::new(resource).is_none());
    }

    #[test]
    fn test_new_resource_defaults_to_internal() {
        let json = serde_json::json!({
            "title": "Summarizer",
            "description": "Summarizes text",
            "type": "Prompt",
            "content": "Summarize this."
        });
        let request: NewResource = serde_json::from_value(json).unwrap();
        assert_eq!(request.source_type, SourceType::Internal);
        assert_eq!(request.fields.resource_type, ResourceType::Prompt);
        assert_eq!(request.fields.content.as_deref(), Some("Summarize this."));
    }
}
