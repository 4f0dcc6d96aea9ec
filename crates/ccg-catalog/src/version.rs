//! Resource version domain models
//!
//! A [`ResourceVersion`] is a full snapshot of a resource's metadata and
//! content. Versions are append-only: once written, only the status fields
//! and the `is_latest` flag ever change.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::hasher::ContentHasher;

/// Version number given to every newly created or forked resource.
pub const INITIAL_VERSION: &str = "1.0.0";

/// Maximum title length in characters.
pub const MAX_TITLE_LEN: usize = 200;

/// Persistent identifier for a version.
///
/// ```
/// use ccg_catalog::version::pid;
/// use uuid::Uuid;
///
/// let id = Uuid::nil();
/// assert_eq!(pid(id, "1.2.0"), "ccg-ai:R-00000000-0000-0000-0000-000000000000@v1.2.0");
/// ```
pub fn pid(resource_id: Uuid, version_number: &str) -> String {
    format!("ccg-ai:R-{}@v{}", resource_id, version_number)
}

fn is_semver_triple(s: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}

/// Parsed MAJOR.MINOR.PATCH version number.
///
/// Ordering is numeric per component, so `1.10.0 > 1.9.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionNumber {
    /// Major component
    pub major: u64,
    /// Minor component
    pub minor: u64,
    /// Patch component
    pub patch: u64,
}

impl VersionNumber {
    /// Parse a strict `MAJOR.MINOR.PATCH` string.
    ///
    /// Prefixes (`v1.0.0`), two-part numbers (`1.0`), and pre-release
    /// suffixes (`1.0.0-beta`) are rejected.
    pub fn parse(s: &str) -> CatalogResult<Self> {
        if !is_semver_triple(s) {
            return Err(CatalogError::InvalidVersionFormat(s.to_string()));
        }

        let mut parts = s.split('.').map(str::parse::<u64>);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(Ok(major)), Some(Ok(minor)), Some(Ok(patch))) => Ok(Self { major, minor, patch }),
            // Components too large for u64
            _ => Err(CatalogError::InvalidVersionFormat(s.to_string())),
        }
    }
}

impl std::fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Kind of content a resource holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// Prompt or prompt template
    Prompt,
    /// Multi-step workflow
    Workflow,
    /// Notebook
    Notebook,
    /// Dataset
    Dataset,
    /// Tool definition
    Tool,
    /// Anything else
    Other,
}

impl ResourceType {
    /// Get the display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Prompt => "Prompt",
            ResourceType::Workflow => "Workflow",
            ResourceType::Notebook => "Notebook",
            ResourceType::Dataset => "Dataset",
            ResourceType::Tool => "Tool",
            ResourceType::Other => "Other",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "prompt" => Some(ResourceType::Prompt),
            "workflow" => Some(ResourceType::Workflow),
            "notebook" => Some(ResourceType::Notebook),
            "dataset" => Some(ResourceType::Dataset),
            "tool" => Some(ResourceType::Tool),
            "other" => Some(ResourceType::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Review status of a version.
///
/// ```text
/// Sandbox ──► Pending Validation ──► Validated
///    └──────────────────────────────────▲
/// ```
///
/// `Validated` is terminal. Pending Validation is a hint to reviewers, not a
/// gate: a sandbox version may be validated directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum VersionStatus {
    /// Unreviewed (default)
    #[default]
    Sandbox,
    /// Owner asked for review
    #[serde(rename = "Pending Validation")]
    PendingValidation,
    /// Approved by an administrator
    Validated,
}

impl VersionStatus {
    /// Get the display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Sandbox => "Sandbox",
            VersionStatus::PendingValidation => "Pending Validation",
            VersionStatus::Validated => "Validated",
        }
    }

    /// Parse from string. Accepts the display name or its snake_case form.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "sandbox" => Some(VersionStatus::Sandbox),
            "pending validation" | "pending" => Some(VersionStatus::PendingValidation),
            "validated" => Some(VersionStatus::Validated),
            _ => None,
        }
    }

    /// Check whether the state machine allows moving to `next`.
    pub fn can_transition_to(&self, next: VersionStatus) -> bool {
        matches!(
            (self, next),
            (VersionStatus::Sandbox, VersionStatus::PendingValidation)
                | (VersionStatus::Sandbox, VersionStatus::Validated)
                | (VersionStatus::PendingValidation, VersionStatus::Validated)
        )
    }

    /// Statuses a caller may choose when creating or publishing.
    pub fn is_initial(&self) -> bool {
        matches!(self, VersionStatus::Sandbox | VersionStatus::PendingValidation)
    }
}

impl std::fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied fields for a new version.
///
/// # Examples
///
/// ```
/// use ccg_catalog::{ResourceType, VersionFields};
///
/// let fields = VersionFields::new("Summarizer", "Summarizes text", ResourceType::Prompt)
///     .with_content("Summarize the following text.")
///     .with_tags(["nlp", "summarization"]);
/// assert_eq!(fields.tags, vec!["nlp", "summarization"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionFields {
    /// Title (required, at most 200 characters)
    pub title: String,

    /// Description (required)
    pub description: String,

    /// Content kind
    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    /// Ordered tags
    #[serde(default)]
    pub tags: Vec<String>,

    /// Content (required for Internal resources)
    #[serde(default)]
    pub content: Option<String>,

    /// Repository URL (required for GitHub-Linked resources)
    #[serde(default)]
    pub repo_url: Option<String>,

    /// Repository tag
    #[serde(default)]
    pub repo_tag: Option<String>,

    /// Repository commit SHA
    #[serde(default)]
    pub repo_commit_sha: Option<String>,

    /// License (required for GitHub-Linked resources)
    #[serde(default)]
    pub license: Option<String>,

    /// Usage example
    #[serde(default)]
    pub example: Option<String>,

    /// Changes since the previous version
    #[serde(default)]
    pub changelog: Option<String>,

    /// Requested initial status
    #[serde(default)]
    pub status: VersionStatus,
}

impl VersionFields {
    /// Create fields with the required metadata.
    pub fn new(title: impl Into<String>, description: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            resource_type,
            tags: Vec::new(),
            content: None,
            repo_url: None,
            repo_tag: None,
            repo_commit_sha: None,
            license: None,
            example: None,
            changelog: None,
            status: VersionStatus::Sandbox,
        }
    }

    /// Set the content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set the tags.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the repository URL and license.
    pub fn with_repo(mut self, repo_url: impl Into<String>, license: impl Into<String>) -> Self {
        self.repo_url = Some(repo_url.into());
        self.license = Some(license.into());
        self
    }

    /// Set the repository tag.
    pub fn with_repo_tag(mut self, tag: impl Into<String>) -> Self {
        self.repo_tag = Some(tag.into());
        self
    }

    /// Set the repository commit SHA.
    pub fn with_commit_sha(mut self, sha: impl Into<String>) -> Self {
        self.repo_commit_sha = Some(sha.into());
        self
    }

    /// Set the usage example.
    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    /// Set the changelog.
    pub fn with_changelog(mut self, changelog: impl Into<String>) -> Self {
        self.changelog = Some(changelog.into());
        self
    }

    /// Set the requested initial status.
    pub fn with_status(mut self, status: VersionStatus) -> Self {
        self.status = status;
        self
    }
}

/// Immutable-content snapshot of a resource.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceVersion {
    /// Version ID
    pub id: Uuid,

    /// Owning resource
    pub resource_id: Uuid,

    /// MAJOR.MINOR.PATCH
    pub version_number: String,

    /// Title
    pub title: String,

    /// Description
    pub description: String,

    /// Content kind
    #[serde(rename = "type")]
    pub resource_type: ResourceType,

    /// Ordered tags
    pub tags: Vec<String>,

    /// Content
    pub content: Option<String>,

    /// SHA-256 of `content`, maintained by the store. Never read from input;
    /// commit recomputes it.
    #[serde(default, skip_deserializing)]
    pub(crate) content_hash: Option<String>,

    /// Repository URL
    pub repo_url: Option<String>,

    /// Repository tag
    pub repo_tag: Option<String>,

    /// Repository commit SHA
    pub repo_commit_sha: Option<String>,

    /// License
    pub license: Option<String>,

    /// Usage example
    pub example: Option<String>,

    /// Changelog
    pub changelog: Option<String>,

    /// Review status
    pub status: VersionStatus,

    /// Set once, when the status becomes Validated
    pub validated_at: Option<DateTime<Utc>>,

    /// Whether this is the resource's current version
    pub is_latest: bool,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last status or latest-flag change
    pub updated_at: DateTime<Utc>,
}

impl ResourceVersion {
    /// Build a latest version from fields. `content_hash` is computed when
    /// `hash_content` is set and content is present.
    pub(crate) fn build(
        resource_id: Uuid,
        version_number: VersionNumber,
        fields: VersionFields,
        hash_content: bool,
    ) -> Self {
        let now = Utc::now();
        let content_hash = if hash_content {
            ContentHasher::hash(fields.content.as_deref())
        } else {
            None
        };

        Self {
            id: Uuid::now_v7(),
            resource_id,
            version_number: version_number.to_string(),
            title: fields.title,
            description: fields.description,
            resource_type: fields.resource_type,
            tags: fields.tags,
            content: fields.content,
            content_hash,
            repo_url: fields.repo_url,
            repo_tag: fields.repo_tag,
            repo_commit_sha: fields.repo_commit_sha,
            license: fields.license,
            example: fields.example,
            changelog: fields.changelog,
            status: fields.status,
            validated_at: None,
            is_latest: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// SHA-256 of the content for Internal resources.
    pub fn content_hash(&self) -> Option<&str> {
        self.content_hash.as_deref()
    }

    /// Persistent identifier.
    pub fn pid(&self) -> String {
        pid(self.resource_id, &self.version_number)
    }

    /// Parsed version number.
    pub fn number(&self) -> CatalogResult<VersionNumber> {
        VersionNumber::parse(&self.version_number)
    }

    /// Check if the version is validated.
    pub fn is_validated(&self) -> bool {
        self.status == VersionStatus::Validated
    }

    /// Case-insensitive substring match on title or description.
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle) || self.description.to_lowercase().contains(&needle)
    }

    /// Check that every tag in `required` is present.
    pub fn has_all_tags(&self, required: &[String]) -> bool {
        required.iter().all(|tag| self.tags.contains(tag))
    }
}
