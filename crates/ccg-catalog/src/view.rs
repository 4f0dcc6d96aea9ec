//! Read projections returned by catalog operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::resource::Resource;
use crate::version::{ResourceType, ResourceVersion, VersionStatus};

/// A resource together with its latest version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRecord {
    /// The resource
    #[serde(flatten)]
    pub resource: Resource,
    /// Its latest version
    pub latest_version: ResourceVersion,
}

impl ResourceRecord {
    /// Persistent identifier of the latest version.
    pub fn pid(&self) -> String {
        self.latest_version.pid()
    }
}

/// Resource projection for detail and list responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceView {
    /// The resource
    #[serde(flatten)]
    pub resource: Resource,
    /// Its latest version
    pub latest_version: ResourceVersion,
    /// Votes cast for the resource
    pub votes_count: u64,
    /// Whether the resource was forked from another
    pub is_fork: bool,
}

impl ResourceView {
    /// Build a view from a record and its vote count.
    pub fn new(record: ResourceRecord, votes_count: u64) -> Self {
        let is_fork = record.resource.is_fork();
        Self {
            resource: record.resource,
            latest_version: record.latest_version,
            votes_count,
            is_fork,
        }
    }
}

/// Version history entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionSummary {
    /// Version ID
    pub id: Uuid,
    /// MAJOR.MINOR.PATCH
    pub version_number: String,
    /// Title
    pub title: String,
    /// Review status
    pub status: VersionStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Validation timestamp
    pub validated_at: Option<DateTime<Utc>>,
    /// Whether this is the current version
    pub is_latest: bool,
    /// Content kind
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    /// Tags
    pub tags: Vec<String>,
    /// Persistent identifier
    pub pid: String,
}

impl From<&ResourceVersion> for VersionSummary {
    fn from(version: &ResourceVersion) -> Self {
        Self {
            id: version.id,
            version_number: version.version_number.clone(),
            title: version.title.clone(),
            status: version.status,
            created_at: version.created_at,
            validated_at: version.validated_at,
            is_latest: version.is_latest,
            resource_type: version.resource_type,
            tags: version.tags.clone(),
            pid: version.pid(),
        }
    }
}

/// Response body for a fork.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ForkReceipt {
    /// Human-readable confirmation
    pub message: String,
    /// The new resource
    pub forked_resource_id: Uuid,
    /// The resource that was forked
    pub original_resource_id: Uuid,
    /// Version number of the source version that was copied
    pub derived_from_version: String,
}

impl ForkReceipt {
    pub(crate) fn new(forked_resource_id: Uuid, original_resource_id: Uuid, derived_from_version: String) -> Self {
        Self {
            message: "Resource forked successfully".to_string(),
            forked_resource_id,
            original_resource_id,
            derived_from_version,
        }
    }
}

/// Response body for a validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReceipt {
    /// Human-readable confirmation
    pub message: String,
    /// The validated resource
    pub resource_id: Uuid,
    /// New status of the latest version
    pub status: VersionStatus,
    /// When it was validated
    pub validated_at: Option<DateTime<Utc>>,
}

impl From<&ResourceRecord> for ValidationReceipt {
    fn from(record: &ResourceRecord) -> Self {
        Self {
            message: "Resource validated successfully".to_string(),
            resource_id: record.resource.id,
            status: record.latest_version.status,
            validated_at: record.latest_version.validated_at,
        }
    }
}
