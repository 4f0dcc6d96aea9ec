//! Resource catalog service
//!
//! [`ResourceCatalog`] is the entry point for every catalog operation. It
//! owns resource lifecycle (create, publish, soft delete) and the query
//! surface, and delegates forking to [`LineageTracker`] and status changes
//! to [`ValidationWorkflow`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ccg_catalog::{
//!     CatalogConfig, ListQuery, MemoryStore, NewResource, ResourceCatalog, ResourceType, VersionFields,
//! };
//! use ccg_rbac::{Actor, Role};
//! use uuid::Uuid;
//!
//! async fn example() -> ccg_catalog::CatalogResult<()> {
//!     let catalog = ResourceCatalog::new(Arc::new(MemoryStore::new()), CatalogConfig::from_env()?)?;
//!     let owner = Actor::new(Uuid::now_v7()).with_role(Role::User);
//!
//!     let created = catalog
//!         .create(
//!             &owner,
//!             NewResource::internal(
//!                 VersionFields::new("Summarizer", "Summarizes text", ResourceType::Prompt)
//!                     .with_content("Summarize the following text."),
//!             ),
//!         )
//!         .await?;
//!
//!     let fork = catalog.fork(&owner, created.resource.id).await?;
//!     println!("forked into {}", fork.receipt.forked_resource_id);
//!
//!     let page = catalog.list(&ListQuery::default().with_search("summar")).await;
//!     println!("{} matching resources", page.count);
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};
use uuid::Uuid;

use ccg_events::{CatalogEvent, EventBus};
use ccg_rbac::{Action, Actor, ResourceKind};

use crate::access::{require, require_owner, require_owner_or_admin};
use crate::config::{CatalogConfig, ConfigError};
use crate::error::{CatalogError, CatalogResult};
use crate::lineage::{ForkOutcome, LineageTracker};
use crate::publisher::EventPublisher;
use crate::query::{ListQuery, Ordering, Page};
use crate::resource::{NewResource, Resource};
use crate::store::MemoryStore;
use crate::validation::ValidationWorkflow;
use crate::version::{ResourceVersion, VersionFields, VersionNumber, INITIAL_VERSION};
use crate::versions::VersionStore;
use crate::view::{ResourceRecord, ResourceView, VersionSummary};
use crate::votes::{VoteCounter, VoteLedger};

/// Catalog of versioned, forkable resources.
#[derive(Clone)]
pub struct ResourceCatalog {
    store: Arc<MemoryStore>,
    config: CatalogConfig,
    votes: Arc<dyn VoteCounter>,
    publisher: EventPublisher,
    lineage: LineageTracker,
    validation: ValidationWorkflow,
}

impl std::fmt::Debug for ResourceCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCatalog")
            .field("config", &self.config)
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

impl ResourceCatalog {
    /// Create a catalog over `store`.
    ///
    /// Vote counts come from an empty [`VoteLedger`] until
    /// [`ResourceCatalog::with_vote_counter`] supplies one. Events are
    /// dropped until [`ResourceCatalog::with_event_bus`] attaches a bus.
    /// Fails if `config` does not pass [`CatalogConfig::validate`].
    pub fn new(store: Arc<MemoryStore>, config: CatalogConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let publisher = EventPublisher::disabled();
        Ok(Self {
            votes: Arc::new(VoteLedger::new(store.clone())),
            lineage: LineageTracker::new(store.clone(), publisher.clone(), config.fork_title_suffix.clone()),
            validation: ValidationWorkflow::new(store.clone(), publisher.clone()),
            store,
            config,
            publisher,
        })
    }

    /// Use `votes` for vote counts.
    pub fn with_vote_counter(mut self, votes: Arc<dyn VoteCounter>) -> Self {
        self.votes = votes;
        self
    }

    /// Publish catalog events to `bus`.
    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.publisher = EventPublisher::new(bus);
        self.lineage = LineageTracker::new(
            self.store.clone(),
            self.publisher.clone(),
            self.config.fork_title_suffix.clone(),
        );
        self.validation = ValidationWorkflow::new(self.store.clone(), self.publisher.clone());
        self
    }

    /// Catalog configuration.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Lineage queries.
    pub fn lineage(&self) -> &LineageTracker {
        &self.lineage
    }

    /// Create a resource with version 1.0.0.
    ///
    /// The resource and its version are committed together or not at all.
    #[instrument(skip(self, actor, request), fields(user_id = %actor.id, source_type = %request.source_type))]
    pub async fn create(&self, actor: &Actor, request: NewResource) -> CatalogResult<ResourceRecord> {
        require(actor, ResourceKind::Resource, Action::Create)?;
        check_initial_status(&request.fields)?;

        let resource = Resource::new(actor.id, request.source_type);
        let mut tx = self.store.begin();
        tx.insert_resource(resource.clone());
        let version = VersionStore::create_version(&mut tx, &resource, INITIAL_VERSION, request.fields)?;
        tx.commit().await?;

        info!(resource_id = %resource.id, "Resource created");

        self.publisher
            .publish(CatalogEvent::ResourceCreated {
                resource_id: resource.id,
                version_id: version.id,
                owner_id: resource.owner_id,
                title: version.title.clone(),
            })
            .await;

        Ok(ResourceRecord {
            resource,
            latest_version: version,
        })
    }

    /// List visible resources.
    ///
    /// Filters apply to each resource's latest version. Each resource
    /// appears at most once.
    pub async fn list(&self, query: &ListQuery) -> Page<ResourceView> {
        let mut matching: Vec<ResourceRecord> = self
            .store
            .live_listing()
            .await
            .into_iter()
            .filter(|(_, latest)| query.filters.matches(latest))
            .map(|(resource, latest)| ResourceRecord {
                resource: resource.into_inner(),
                latest_version: latest,
            })
            .collect();

        let ids: Vec<Uuid> = matching.iter().map(|r| r.resource.id).collect();
        let counts = self.votes.vote_counts(&ids).await;
        let votes_of = |record: &ResourceRecord| counts.get(&record.resource.id).copied().unwrap_or(0);

        // Listing arrives in insertion order; sorts below are stable.
        match query.ordering {
            Ordering::OldestFirst => {
                matching.sort_by(|a, b| a.resource.created_at.cmp(&b.resource.created_at));
            }
            Ordering::NewestFirst => {
                matching.reverse();
                matching.sort_by(|a, b| b.resource.created_at.cmp(&a.resource.created_at));
            }
            Ordering::MostVoted => {
                matching.reverse();
                matching.sort_by(|a, b| b.resource.created_at.cmp(&a.resource.created_at));
                matching.sort_by(|a, b| votes_of(b).cmp(&votes_of(a)));
            }
        }

        let views: Vec<ResourceView> = matching
            .into_iter()
            .map(|record| {
                let votes = votes_of(&record);
                ResourceView::new(record, votes)
            })
            .collect();

        Page::paginate(views, query.page, query.page_size)
    }

    /// Fetch a visible resource with its latest version.
    pub async fn get_by_id(&self, id: Uuid) -> CatalogResult<ResourceRecord> {
        let resource = self.store.live_resource(id).await?;
        let latest_version = self
            .store
            .latest_version(id)
            .await
            .ok_or(CatalogError::NoVersions(id))?;
        Ok(ResourceRecord {
            resource: resource.into_inner(),
            latest_version,
        })
    }

    /// Fetch the detail projection of a visible resource.
    pub async fn detail(&self, id: Uuid) -> CatalogResult<ResourceView> {
        let record = self.get_by_id(id).await?;
        let votes = self.votes.vote_count(id).await;
        Ok(ResourceView::new(record, votes))
    }

    /// Fork a resource. Not idempotent: each call creates a new fork.
    pub async fn fork(&self, actor: &Actor, resource_id: Uuid) -> CatalogResult<ForkOutcome> {
        self.lineage.fork(actor, resource_id).await
    }

    /// Validate a resource's latest version. Not idempotent: a second call
    /// fails with `AlreadyValidated`.
    pub async fn validate(&self, actor: &Actor, resource_id: Uuid) -> CatalogResult<ResourceRecord> {
        self.validation.validate(actor, resource_id).await
    }

    /// Move a resource's latest version to Pending Validation.
    pub async fn request_validation(&self, actor: &Actor, resource_id: Uuid) -> CatalogResult<ResourceRecord> {
        self.validation.request_validation(actor, resource_id).await
    }

    /// Every version of a visible resource, newest created first.
    pub async fn version_history(&self, resource_id: Uuid) -> CatalogResult<Vec<ResourceVersion>> {
        self.store.live_resource(resource_id).await?;
        Ok(self.store.versions(resource_id).await)
    }

    /// Version history as summaries, newest first.
    pub async fn version_summaries(&self, resource_id: Uuid) -> CatalogResult<Vec<VersionSummary>> {
        let versions = self.version_history(resource_id).await?;
        Ok(versions.iter().map(VersionSummary::from).collect())
    }

    /// Append a new latest version. Owner only.
    ///
    /// The number must be strictly greater than the current latest. The
    /// previous latest loses its flag in the same transaction.
    #[instrument(skip(self, actor, version_fields), fields(user_id = %actor.id))]
    pub async fn publish_version(
        &self,
        actor: &Actor,
        resource_id: Uuid,
        version_number: &str,
        version_fields: VersionFields,
    ) -> CatalogResult<ResourceRecord> {
        let requested = VersionNumber::parse(version_number)?;
        check_initial_status(&version_fields)?;

        let mut tx = self.store.begin();
        let resource = tx.lock_live_resource(resource_id).await?;
        require_owner(actor, resource.owner_id, "publish versions")?;

        let current = tx
            .latest_version(resource_id)
            .await
            .ok_or(CatalogError::NoVersions(resource_id))?;

        let normalized = requested.to_string();
        let exists = tx
            .versions_of(resource_id)
            .await
            .iter()
            .any(|v| v.version_number == normalized);
        if exists {
            return Err(CatalogError::DuplicateVersion {
                resource_id,
                version: normalized,
            });
        }
        if requested <= current.number()? {
            return Err(CatalogError::VersionNotNewer {
                current: current.version_number,
                requested: normalized,
            });
        }

        VersionStore::supersede_latest(&mut tx, resource_id).await?;
        let version = VersionStore::create_version(&mut tx, &resource, &normalized, version_fields)?;
        tx.commit().await?;

        info!(previous = %current.version_number, version = %version.version_number, "Version published");

        self.publisher
            .publish(CatalogEvent::VersionPublished {
                resource_id,
                version_id: version.id,
                version_number: version.version_number.clone(),
                owner_id: resource.owner_id,
            })
            .await;

        Ok(ResourceRecord {
            resource: resource.into_inner(),
            latest_version: version,
        })
    }

    /// Soft-delete a resource. Owner or admin only.
    #[instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn delete(&self, actor: &Actor, resource_id: Uuid) -> CatalogResult<()> {
        let mut tx = self.store.begin();
        let resource = tx.lock_live_resource(resource_id).await?;
        require_owner_or_admin(actor, resource.owner_id, "delete resources")?;

        let mut deleted = resource.into_inner();
        let now = Utc::now();
        deleted.deleted_at = Some(now);
        deleted.updated_at = now;
        tx.update_resource(deleted)?;
        tx.commit().await?;

        info!("Resource deleted");

        self.publisher
            .publish(CatalogEvent::ResourceDeleted {
                resource_id,
                deleted_by: actor.id,
            })
            .await;
        Ok(())
    }

    /// Ancestors of a visible resource, immediate parent first.
    pub async fn ancestry(&self, resource_id: Uuid) -> CatalogResult<Vec<Resource>> {
        self.lineage.ancestry(resource_id).await
    }

    /// Visible direct forks of a resource, newest first.
    pub async fn forks_of(&self, resource_id: Uuid) -> CatalogResult<Vec<Resource>> {
        self.lineage.forks_of(resource_id).await
    }
}

fn check_initial_status(fields: &VersionFields) -> CatalogResult<()> {
    if fields.status.is_initial() {
        Ok(())
    } else {
        Err(CatalogError::InvalidField {
            field: "status",
            reason: format!("cannot start a version as {}", fields.status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::ContentHasher;
    use crate::resource::SourceType;
    use crate::version::{ResourceType, VersionStatus};
    use ccg_rbac::Role;

    fn user() -> Actor {
        Actor::new(Uuid::now_v7()).with_role(Role::User)
    }

    fn admin() -> Actor {
        Actor::new(Uuid::now_v7()).with_role(Role::Admin)
    }

    fn catalog() -> ResourceCatalog {
        ResourceCatalog::new(Arc::new(MemoryStore::new()), CatalogConfig::default()).unwrap()
    }

    fn prompt(title: &str) -> NewResource {
        NewResource::internal(
            VersionFields::new(title, format!("{title} description"), ResourceType::Prompt).with_content("hello"),
        )
    }

    #[tokio::test]
    async fn test_create_internal() {
        let catalog = catalog();
        let owner = user();
        let record = catalog.create(&owner, prompt("Greeter")).await.unwrap();

        assert_eq!(record.resource.owner_id, owner.id);
        assert_eq!(record.latest_version.version_number, "1.0.0");
        assert!(record.latest_version.is_latest);
        assert_eq!(
            record.latest_version.content_hash(),
            Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
        );
        assert_eq!(record.pid(), format!("ccg-ai:R-{}@v1.0.0", record.resource.id));
    }

    #[tokio::test]
    async fn test_create_failure_leaves_nothing() {
        let catalog = catalog();
        let request = NewResource::github_linked(VersionFields::new("Tool", "A tool", ResourceType::Tool));

        let err = catalog.create(&user(), request).await.unwrap_err();
        assert_eq!(err.field(), Some("repo_url"));
        assert_eq!(catalog.store().resource_count().await, 0);
        assert_eq!(catalog.store().version_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_cannot_start_validated() {
        let catalog = catalog();
        let mut request = prompt("Sneaky");
        request.fields.status = VersionStatus::Validated;

        let err = catalog.create(&user(), request).await.unwrap_err();
        assert_eq!(err.field(), Some("status"));

        let mut request = prompt("Eager");
        request.fields.status = VersionStatus::PendingValidation;
        let record = catalog.create(&user(), request).await.unwrap();
        assert_eq!(record.latest_version.status, VersionStatus::PendingValidation);
    }

    #[tokio::test]
    async fn test_publish_version_moves_latest() {
        let catalog = catalog();
        let owner = user();
        let created = catalog.create(&owner, prompt("Greeter")).await.unwrap();
        let id = created.resource.id;

        let fields = VersionFields::new("Greeter", "Now friendlier", ResourceType::Prompt)
            .with_content("hello there")
            .with_changelog("Friendlier tone");
        let published = catalog.publish_version(&owner, id, "1.1.0", fields).await.unwrap();
        assert_eq!(published.latest_version.version_number, "1.1.0");
        assert_eq!(
            published.latest_version.content_hash(),
            ContentHasher::hash(Some("hello there")).as_deref()
        );

        let history = catalog.version_history(id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|v| v.is_latest).count(), 1);
        assert_eq!(history[0].version_number, "1.1.0");
        assert!(history[0].is_latest);
        assert!(!history[1].is_latest);

        let detail = catalog.detail(id).await.unwrap();
        assert_eq!(detail.latest_version.version_number, "1.1.0");
    }

    #[tokio::test]
    async fn test_publish_version_rules() {
        let catalog = catalog();
        let owner = user();
        let id = catalog.create(&owner, prompt("Greeter")).await.unwrap().resource.id;
        let fields = || VersionFields::new("Greeter", "d", ResourceType::Prompt).with_content("x");

        let err = catalog.publish_version(&owner, id, "1.0", fields()).await.unwrap_err();
        assert!(matches!(err, CatalogError::InvalidVersionFormat(_)));

        let err = catalog.publish_version(&owner, id, "1.0.0", fields()).await.unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateVersion { .. }));

        catalog.publish_version(&owner, id, "1.10.0", fields()).await.unwrap();
        let err = catalog.publish_version(&owner, id, "1.9.0", fields()).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogError::VersionNotNewer { ref current, .. } if current == "1.10.0"
        ));

        let err = catalog.publish_version(&user(), id, "2.0.0", fields()).await.unwrap_err();
        assert!(matches!(err, CatalogError::PermissionDenied(_)));

        assert_eq!(catalog.version_history(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_everywhere() {
        let catalog = catalog();
        let owner = user();
        let id = catalog.create(&owner, prompt("Doomed")).await.unwrap().resource.id;

        let err = catalog.delete(&user(), id).await.unwrap_err();
        assert!(matches!(err, CatalogError::PermissionDenied(_)));

        catalog.delete(&owner, id).await.unwrap();

        let not_found = |r: CatalogResult<_>| matches!(r, Err(CatalogError::ResourceNotFound(_)));
        assert!(not_found(catalog.get_by_id(id).await.map(|_| ())));
        assert!(not_found(catalog.detail(id).await.map(|_| ())));
        assert!(not_found(catalog.fork(&owner, id).await.map(|_| ())));
        assert!(not_found(catalog.validate(&admin(), id).await.map(|_| ())));
        assert!(not_found(catalog.version_history(id).await.map(|_| ())));
        assert!(not_found(catalog.delete(&owner, id).await));
        assert_eq!(catalog.list(&ListQuery::default()).await.count, 0);
    }

    #[tokio::test]
    async fn test_admin_can_delete() {
        let catalog = catalog();
        let id = catalog.create(&user(), prompt("Spam")).await.unwrap().resource.id;
        catalog.delete(&admin(), id).await.unwrap();
        assert!(catalog.get_by_id(id).await.is_err());
    }

    #[tokio::test]
    async fn test_list_orders_and_paginates() {
        let catalog = catalog();
        let owner = user();
        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(catalog.create(&owner, prompt(&format!("Prompt {i}"))).await.unwrap().resource.id);
        }

        let newest: Vec<Uuid> = catalog
            .list(&ListQuery::default())
            .await
            .results
            .iter()
            .map(|v| v.resource.id)
            .collect();
        let mut expected = ids.clone();
        expected.reverse();
        assert_eq!(newest, expected);

        let oldest = catalog
            .list(&ListQuery::default().with_ordering(Ordering::OldestFirst).with_page_size(2).with_page(2))
            .await;
        assert_eq!(oldest.count, 5);
        assert_eq!(
            oldest.results.iter().map(|v| v.resource.id).collect::<Vec<_>>(),
            ids[2..4].to_vec()
        );
        assert!(oldest.has_next);
        assert!(oldest.has_previous);
    }

    #[tokio::test]
    async fn test_list_by_votes() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(VoteLedger::new(store.clone()));
        let catalog = ResourceCatalog::new(store, CatalogConfig::default())
            .unwrap()
            .with_vote_counter(ledger.clone());

        let owner = user();
        let quiet = catalog.create(&owner, prompt("Quiet")).await.unwrap().resource.id;
        let popular = catalog.create(&owner, prompt("Popular")).await.unwrap().resource.id;
        let newest = catalog.create(&owner, prompt("Newest")).await.unwrap().resource.id;

        for _ in 0..3 {
            ledger.toggle_vote(&user(), popular).await.unwrap();
        }
        ledger.toggle_vote(&user(), quiet).await.unwrap();

        let page = catalog
            .list(&ListQuery::default().with_ordering(Ordering::MostVoted))
            .await;
        let order: Vec<(Uuid, u64)> = page.results.iter().map(|v| (v.resource.id, v.votes_count)).collect();
        assert_eq!(order, vec![(popular, 3), (quiet, 1), (newest, 0)]);
        assert_eq!(catalog.detail(popular).await.unwrap().votes_count, 3);
    }

    #[tokio::test]
    async fn test_list_filters_on_latest_version_only() {
        let catalog = catalog();
        let owner = user();
        let id = catalog
            .create(
                &owner,
                NewResource::internal(
                    VersionFields::new("Pipeline", "Moves data", ResourceType::Workflow)
                        .with_content("steps")
                        .with_tags(["workflow"]),
                ),
            )
            .await
            .unwrap()
            .resource
            .id;
        catalog.create(&owner, prompt("Other")).await.unwrap();

        let tagged = catalog.list(&ListQuery::default().with_tags(["workflow"])).await;
        assert_eq!(tagged.count, 1);
        assert_eq!(tagged.results[0].resource.id, id);

        // The new latest version drops the tag
        let fields = VersionFields::new("Pipeline", "Moves data", ResourceType::Workflow).with_content("steps v2");
        catalog.publish_version(&owner, id, "2.0.0", fields).await.unwrap();
        assert_eq!(catalog.list(&ListQuery::default().with_tags(["workflow"])).await.count, 0);

        let searched = catalog.list(&ListQuery::default().with_search("MOVES")).await;
        assert_eq!(searched.count, 1);
    }

    #[tokio::test]
    async fn test_summaries_carry_pid() {
        let catalog = catalog();
        let record = catalog.create(&user(), prompt("Greeter")).await.unwrap();
        let summaries = catalog.version_summaries(record.resource.id).await.unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].pid, record.pid());
        assert_eq!(summaries[0].status, VersionStatus::Sandbox);
    }

    #[tokio::test]
    async fn test_fork_increments_source_only() {
        let catalog = catalog();
        let owner = user();
        let source = catalog.create(&owner, prompt("Base")).await.unwrap();
        let forker = user();

        let outcome = catalog.fork(&forker, source.resource.id).await.unwrap();
        let fork = catalog.detail(outcome.receipt.forked_resource_id).await.unwrap();
        assert!(fork.is_fork);
        assert_eq!(fork.resource.owner_id, forker.id);
        assert_eq!(fork.resource.source_type, SourceType::Internal);

        let source_after = catalog.get_by_id(source.resource.id).await.unwrap();
        assert_eq!(source_after.resource.forks_count, 1);
        assert_eq!(fork.resource.forks_count, 0);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = CatalogConfig::default().with_max_page_size(0);
        let err = ResourceCatalog::new(Arc::new(MemoryStore::new()), config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "max_page_size", .. }));

        let err = CatalogError::from(err);
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "INVALID_CONFIG");
    }
}
