//! Fork lineage
//!
//! [`LineageTracker`] forks resources and answers lineage questions. The
//! lineage graph is stored as a parent pointer on each resource
//! (`derived_from_resource`), so a fork of a fork points at its immediate
//! parent and full ancestry is found by walking.
//!
//! ## Forking
//!
//! A fork is one transaction holding the source's row lock: insert the new
//! Internal resource, copy the source's latest version into it as 1.0.0 in
//! Sandbox, and increment the source's `forks_count`. Only the direct
//! source's counter changes; ancestors are never locked.
//!
//! Forking is not idempotent. Each call creates another fork.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use ccg_events::CatalogEvent;
use ccg_rbac::{Action, Actor, ResourceKind};

use crate::access::require;
use crate::error::{CatalogError, CatalogResult};
use crate::publisher::EventPublisher;
use crate::resource::{LiveResource, Resource};
use crate::store::MemoryStore;
use crate::versions::VersionStore;
use crate::view::{ForkReceipt, ResourceRecord};

/// A completed fork.
#[derive(Debug, Clone, PartialEq)]
pub struct ForkOutcome {
    /// The new resource and its initial version
    pub fork: ResourceRecord,
    /// Response body for the caller
    pub receipt: ForkReceipt,
}

/// Forks resources and walks the lineage graph.
#[derive(Debug, Clone)]
pub struct LineageTracker {
    store: Arc<MemoryStore>,
    publisher: EventPublisher,
    fork_title_suffix: String,
}

impl LineageTracker {
    /// Create a tracker over `store`.
    pub fn new(store: Arc<MemoryStore>, publisher: EventPublisher, fork_title_suffix: impl Into<String>) -> Self {
        Self {
            store,
            publisher,
            fork_title_suffix: fork_title_suffix.into(),
        }
    }

    /// Fork `source_id` into a new resource owned by `actor`.
    ///
    /// Forking one's own resource is allowed.
    #[instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn fork(&self, actor: &Actor, source_id: Uuid) -> CatalogResult<ForkOutcome> {
        require(actor, ResourceKind::Resource, Action::Fork)?;

        let mut tx = self.store.begin();
        let source = tx.lock_live_resource(source_id).await?;
        let source_version = tx
            .latest_version(source_id)
            .await
            .ok_or(CatalogError::NoVersionsToFork(source_id))?;

        let fork = Resource::fork_of(actor.id, source.id, source_version.id);
        tx.insert_resource(fork.clone());
        let version = VersionStore::copy_for_fork(&mut tx, &fork, &source_version, &self.fork_title_suffix)?;
        tx.increment_forks(source.id);
        tx.commit().await?;

        info!(
            forked_resource_id = %fork.id,
            derived_from_version = %source_version.version_number,
            "Resource forked"
        );

        self.publisher
            .publish(CatalogEvent::ResourceForked {
                source_resource_id: source.id,
                source_owner_id: source.owner_id,
                forked_resource_id: fork.id,
                derived_from_version: source_version.id,
                forked_by: actor.id,
                title: source_version.title.clone(),
            })
            .await;

        let receipt = ForkReceipt::new(fork.id, source.id, source_version.version_number);
        Ok(ForkOutcome {
            fork: ResourceRecord {
                resource: fork,
                latest_version: version,
            },
            receipt,
        })
    }

    /// Ancestors of a resource, immediate parent first.
    ///
    /// The walk stops at the first ancestor that is missing or soft-deleted.
    pub async fn ancestry(&self, resource_id: Uuid) -> CatalogResult<Vec<Resource>> {
        let start = self.store.live_resource(resource_id).await?;

        let mut seen = HashSet::from([start.id]);
        let mut ancestors = Vec::new();
        let mut next = start.derived_from_resource;

        while let Some(parent_id) = next {
            if !seen.insert(parent_id) {
                break;
            }
            let Ok(parent) = self.store.live_resource(parent_id).await else {
                break;
            };
            next = parent.derived_from_resource;
            ancestors.push(parent.into_inner());
        }

        Ok(ancestors)
    }

    /// Visible direct forks of a resource, newest first.
    pub async fn forks_of(&self, resource_id: Uuid) -> CatalogResult<Vec<Resource>> {
        self.store.live_resource(resource_id).await?;
        Ok(self
            .store
            .forks_of(resource_id)
            .await
            .into_iter()
            .map(LiveResource::into_inner)
            .collect())
    }
}
