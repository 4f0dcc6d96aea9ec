//! Version creation and status transitions.
//!
//! Every write goes through a [`Transaction`], so a version is never visible
//! without the resource-level changes made alongside it.

use chrono::Utc;

use crate::error::{CatalogError, CatalogResult};
use crate::resource::{Resource, SourceType};
use crate::store::Transaction;
use crate::version::{ResourceVersion, VersionFields, VersionNumber, VersionStatus, INITIAL_VERSION, MAX_TITLE_LEN};

/// Writes versions and enforces their per-source rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionStore;

impl VersionStore {
    /// Check the fields a version of `source_type` must carry.
    pub fn validate_fields(source_type: SourceType, fields: &VersionFields) -> CatalogResult<()> {
        if is_blank(Some(&fields.title)) {
            return Err(CatalogError::MissingRequiredField { field: "title" });
        }
        let title_len = fields.title.chars().count();
        if title_len > MAX_TITLE_LEN {
            return Err(CatalogError::InvalidField {
                field: "title",
                reason: format!("must be at most {} characters, got {}", MAX_TITLE_LEN, title_len),
            });
        }
        if is_blank(Some(&fields.description)) {
            return Err(CatalogError::MissingRequiredField { field: "description" });
        }

        match source_type {
            SourceType::Internal => {
                if is_blank(fields.content.as_ref()) {
                    return Err(CatalogError::MissingRequiredField { field: "content" });
                }
            }
            SourceType::GitHubLinked => {
                if is_blank(fields.repo_url.as_ref()) {
                    return Err(CatalogError::MissingRequiredField { field: "repo_url" });
                }
                if is_blank(fields.license.as_ref()) {
                    return Err(CatalogError::MissingRequiredField { field: "license" });
                }
            }
        }

        Ok(())
    }

    /// Stage a new latest version of `resource`.
    ///
    /// The caller clears `is_latest` on any prior latest version in the same
    /// transaction (see [`VersionStore::supersede_latest`]).
    pub fn create_version(
        tx: &mut Transaction<'_>,
        resource: &Resource,
        version_number: &str,
        fields: VersionFields,
    ) -> CatalogResult<ResourceVersion> {
        let number = VersionNumber::parse(version_number)?;
        Self::validate_fields(resource.source_type, &fields)?;

        let hash_content = resource.source_type == SourceType::Internal;
        let version = ResourceVersion::build(resource.id, number, fields, hash_content);
        tx.insert_version(version.clone())?;
        Ok(version)
    }

    /// Stage the initial version of a fork, copied from `source`.
    ///
    /// Repository fields are left behind since the fork is Internal, and the
    /// status always starts at Sandbox. The source title is shortened when
    /// needed so the suffixed title stays within [`MAX_TITLE_LEN`].
    pub fn copy_for_fork(
        tx: &mut Transaction<'_>,
        fork: &Resource,
        source: &ResourceVersion,
        title_suffix: &str,
    ) -> CatalogResult<ResourceVersion> {
        let fields = VersionFields {
            title: fork_title(&source.title, title_suffix),
            description: source.description.clone(),
            resource_type: source.resource_type,
            tags: source.tags.clone(),
            content: source.content.clone(),
            repo_url: None,
            repo_tag: None,
            repo_commit_sha: None,
            license: None,
            example: source.example.clone(),
            changelog: None,
            status: VersionStatus::Sandbox,
        };

        let number = VersionNumber { major: 1, minor: 0, patch: 0 };
        debug_assert_eq!(number.to_string(), INITIAL_VERSION);

        let version = ResourceVersion::build(fork.id, number, fields, true);
        tx.insert_version(version.clone())?;
        Ok(version)
    }

    /// Clear `is_latest` on the current latest version, returning it.
    pub async fn supersede_latest(
        tx: &mut Transaction<'_>,
        resource_id: uuid::Uuid,
    ) -> CatalogResult<ResourceVersion> {
        let mut latest = tx
            .latest_version(resource_id)
            .await
            .ok_or(CatalogError::NoVersions(resource_id))?;

        latest.is_latest = false;
        latest.updated_at = Utc::now();
        tx.update_version(latest.clone())?;
        Ok(latest)
    }

    /// Move a version to Validated and stamp `validated_at`.
    pub fn mark_validated(tx: &mut Transaction<'_>, mut version: ResourceVersion) -> CatalogResult<ResourceVersion> {
        if version.status == VersionStatus::Validated {
            return Err(CatalogError::AlreadyValidated(version.resource_id));
        }

        let now = Utc::now();
        version.status = VersionStatus::Validated;
        version.validated_at = Some(now);
        version.updated_at = now;
        tx.update_version(version.clone())?;
        Ok(version)
    }

    /// Move a version from Sandbox to Pending Validation.
    pub fn mark_pending(tx: &mut Transaction<'_>, mut version: ResourceVersion) -> CatalogResult<ResourceVersion> {
        let next = VersionStatus::PendingValidation;
        if !version.status.can_transition_to(next) {
            return Err(CatalogError::InvalidTransition {
                from: version.status,
                to: next,
            });
        }

        version.status = next;
        version.updated_at = Utc::now();
        tx.update_version(version.clone())?;
        Ok(version)
    }
}

fn fork_title(title: &str, suffix: &str) -> String {
    let room = MAX_TITLE_LEN.saturating_sub(suffix.chars().count());
    let base: String = title.chars().take(room).collect();
    format!("{}{}", base.trim_end(), suffix)
}

fn is_blank(value: Option<&String>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::ContentHasher;
    use crate::store::MemoryStore;
    use crate::version::ResourceType;
    use uuid::Uuid;

    fn prompt() -> VersionFields {
        VersionFields::new("Summarizer", "Summarizes text", ResourceType::Prompt).with_content("hello")
    }

    #[test]
    fn test_internal_requires_content() {
        let fields = VersionFields::new("t", "d", ResourceType::Prompt);
        let err = VersionStore::validate_fields(SourceType::Internal, &fields).unwrap_err();
        assert!(matches!(err, CatalogError::MissingRequiredField { field: "content" }));

        let blank = fields.with_content("   ");
        assert!(VersionStore::validate_fields(SourceType::Internal, &blank).is_err());
    }

    #[test]
    fn test_github_requires_repo_url_and_license() {
        let fields = VersionFields::new("t", "d", ResourceType::Tool);
        let err = VersionStore::validate_fields(SourceType::GitHubLinked, &fields).unwrap_err();
        assert_eq!(err.field(), Some("repo_url"));

        let mut fields = fields.with_repo("https://github.com/ccg-ai/tool", "");
        let err = VersionStore::validate_fields(SourceType::GitHubLinked, &fields).unwrap_err();
        assert_eq!(err.field(), Some("license"));

        fields.license = Some("MIT".into());
        VersionStore::validate_fields(SourceType::GitHubLinked, &fields).unwrap();
    }

    #[test]
    fn test_title_rules() {
        let blank = VersionFields::new("  ", "d", ResourceType::Prompt).with_content("c");
        assert_eq!(
            VersionStore::validate_fields(SourceType::Internal, &blank).unwrap_err().field(),
            Some("title")
        );

        let long = VersionFields::new("x".repeat(MAX_TITLE_LEN + 1), "d", ResourceType::Prompt).with_content("c");
        assert!(matches!(
            VersionStore::validate_fields(SourceType::Internal, &long),
            Err(CatalogError::InvalidField { field: "title", .. })
        ));

        let exact = VersionFields::new("é".repeat(MAX_TITLE_LEN), "d", ResourceType::Prompt).with_content("c");
        VersionStore::validate_fields(SourceType::Internal, &exact).unwrap();
    }

    #[tokio::test]
    async fn test_create_version_hashes_internal_content() {
        let store = MemoryStore::new();
        let resource = Resource::new(Uuid::now_v7(), SourceType::Internal);
        let mut tx = store.begin();
        tx.insert_resource(resource.clone());

        let version = VersionStore::create_version(&mut tx, &resource, "1.0.0", prompt()).unwrap();
        assert_eq!(version.content_hash(), ContentHasher::hash(Some("hello")).as_deref());
        assert!(version.is_latest);
        assert_eq!(version.status, VersionStatus::Sandbox);
    }

    #[tokio::test]
    async fn test_create_version_does_not_hash_github_content() {
        let store = MemoryStore::new();
        let resource = Resource::new(Uuid::now_v7(), SourceType::GitHubLinked);
        let mut tx = store.begin();
        tx.insert_resource(resource.clone());

        let fields = VersionFields::new("Tool", "A tool", ResourceType::Tool)
            .with_repo("https://github.com/ccg-ai/tool", "MIT")
            .with_content("readme");
        let version = VersionStore::create_version(&mut tx, &resource, "1.0.0", fields).unwrap();
        assert_eq!(version.content_hash(), None);
    }

    #[tokio::test]
    async fn test_create_version_rejects_bad_number() {
        let store = MemoryStore::new();
        let resource = Resource::new(Uuid::now_v7(), SourceType::Internal);
        let mut tx = store.begin();
        tx.insert_resource(resource.clone());

        for bad in ["1.0", "v1.0.0"] {
            assert!(matches!(
                VersionStore::create_version(&mut tx, &resource, bad, prompt()),
                Err(CatalogError::InvalidVersionFormat(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_copy_for_fork_drops_repo_fields() {
        let store = MemoryStore::new();
        let source_resource = Resource::new(Uuid::now_v7(), SourceType::GitHubLinked);
        let mut source = ResourceVersion::build(
            source_resource.id,
            VersionNumber::parse("2.3.1").unwrap(),
            VersionFields::new("Tool", "A tool", ResourceType::Tool)
                .with_repo("https://github.com/ccg-ai/tool", "MIT")
                .with_repo_tag("v2.3.1")
                .with_tags(["cli"])
                .with_content("readme"),
            false,
        );
        source.status = VersionStatus::Validated;

        let fork = Resource::fork_of(Uuid::now_v7(), source_resource.id, source.id);
        let mut tx = store.begin();
        tx.insert_resource(fork.clone());
        let copy = VersionStore::copy_for_fork(&mut tx, &fork, &source, " (Fork)").unwrap();

        assert_eq!(copy.title, "Tool (Fork)");
        assert_eq!(copy.version_number, INITIAL_VERSION);
        assert_eq!(copy.status, VersionStatus::Sandbox);
        assert_eq!(copy.tags, vec!["cli"]);
        assert!(copy.repo_url.is_none());
        assert!(copy.license.is_none());
        assert!(copy.repo_tag.is_none());
        assert_eq!(copy.content_hash(), ContentHasher::hash(Some("readme")).as_deref());
        assert_eq!(copy.resource_id, fork.id);
    }

    #[tokio::test]
    async fn test_mark_validated_once() {
        let store = MemoryStore::new();
        let resource = Resource::new(Uuid::now_v7(), SourceType::Internal);
        let mut tx = store.begin();
        tx.insert_resource(resource.clone());
        let version = VersionStore::create_version(&mut tx, &resource, "1.0.0", prompt()).unwrap();

        let validated = VersionStore::mark_validated(&mut tx, version).unwrap();
        assert_eq!(validated.status, VersionStatus::Validated);
        assert!(validated.validated_at.is_some());

        let err = VersionStore::mark_validated(&mut tx, validated).unwrap_err();
        assert!(matches!(err, CatalogError::AlreadyValidated(id) if id == resource.id));
    }

    #[tokio::test]
    async fn test_mark_pending_only_from_sandbox() {
        let store = MemoryStore::new();
        let resource = Resource::new(Uuid::now_v7(), SourceType::Internal);
        let mut tx = store.begin();
        tx.insert_resource(resource.clone());
        let version = VersionStore::create_version(&mut tx, &resource, "1.0.0", prompt()).unwrap();

        let pending = VersionStore::mark_pending(&mut tx, version).unwrap();
        assert_eq!(pending.status, VersionStatus::PendingValidation);

        let err = VersionStore::mark_pending(&mut tx, pending).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidTransition {
                from: VersionStatus::PendingValidation,
                to: VersionStatus::PendingValidation
            }
        ));
    }

    #[tokio::test]
    async fn test_fork_title_fits_max_length() {
        let store = MemoryStore::new();
        let source_resource = Resource::new(Uuid::now_v7(), SourceType::Internal);
        let source = ResourceVersion::build(
            source_resource.id,
            VersionNumber::parse("1.0.0").unwrap(),
            VersionFields::new("é".repeat(MAX_TITLE_LEN), "Long", ResourceType::Prompt).with_content("x"),
            true,
        );

        let fork = Resource::fork_of(Uuid::now_v7(), source_resource.id, source.id);
        let mut tx = store.begin();
        tx.insert_resource(fork.clone());
        let copy = VersionStore::copy_for_fork(&mut tx, &fork, &source, " (Fork)").unwrap();

        assert_eq!(copy.title.chars().count(), MAX_TITLE_LEN);
        assert!(copy.title.ends_with(" (Fork)"));
        assert!(copy.title.starts_with("éé"));
        let refit = VersionFields::new(copy.title, "d", ResourceType::Prompt).with_content("x");
        VersionStore::validate_fields(SourceType::Internal, &refit).unwrap();
    }

    #[test]
    fn test_short_fork_title_is_untouched() {
        assert_eq!(fork_title("Prompt", " (Fork)"), "Prompt (Fork)");
    }
}
