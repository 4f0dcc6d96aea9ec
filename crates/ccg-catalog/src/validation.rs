//! Admin validation workflow
//!
//! Status moves `Sandbox -> Pending Validation -> Validated`, or straight
//! from `Sandbox` to `Validated`. `Validated` is terminal.
//!
//! Validation is not idempotent: validating an already validated resource
//! is rejected with `AlreadyValidated` rather than silently accepted.

use std::sync::Arc;

use tracing::{debug, info, instrument};
use uuid::Uuid;

use ccg_events::CatalogEvent;
use ccg_rbac::Actor;

use crate::access::{require_admin, require_owner_or_admin};
use crate::error::{CatalogError, CatalogResult};
use crate::publisher::EventPublisher;
use crate::store::MemoryStore;
use crate::versions::VersionStore;
use crate::view::ResourceRecord;

/// Drives status changes on a resource's latest version.
#[derive(Debug, Clone)]
pub struct ValidationWorkflow {
    store: Arc<MemoryStore>,
    publisher: EventPublisher,
}

impl ValidationWorkflow {
    /// Create a workflow over `store`.
    pub fn new(store: Arc<MemoryStore>, publisher: EventPublisher) -> Self {
        Self { store, publisher }
    }

    /// Validate the latest version of a resource. Administrators only.
    #[instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn validate(&self, actor: &Actor, resource_id: Uuid) -> CatalogResult<ResourceRecord> {
        require_admin(actor, "validate resources").inspect_err(|_| {
            debug!("Validation refused: actor is not an administrator");
        })?;

        let mut tx = self.store.begin();
        let resource = tx.lock_live_resource(resource_id).await?;
        let latest = tx
            .latest_version(resource_id)
            .await
            .ok_or(CatalogError::NoVersions(resource_id))?;

        let validated = VersionStore::mark_validated(&mut tx, latest)?;
        tx.commit().await?;

        info!(version = %validated.version_number, "Resource validated");

        self.publisher
            .publish(CatalogEvent::ResourceValidated {
                resource_id,
                version_id: validated.id,
                owner_id: resource.owner_id,
                validated_by: actor.id,
                title: validated.title.clone(),
                validated_at: validated.validated_at.unwrap_or(validated.updated_at),
            })
            .await;

        Ok(ResourceRecord {
            resource: resource.into_inner(),
            latest_version: validated,
        })
    }

    /// Ask administrators to review the latest version.
    ///
    /// Moves it from Sandbox to Pending Validation. Owner or admin only.
    #[instrument(skip(self, actor), fields(user_id = %actor.id))]
    pub async fn request_validation(&self, actor: &Actor, resource_id: Uuid) -> CatalogResult<ResourceRecord> {
        let mut tx = self.store.begin();
        let resource = tx.lock_live_resource(resource_id).await?;
        require_owner_or_admin(actor, resource.owner_id, "request validation")?;

        let latest = tx
            .latest_version(resource_id)
            .await
            .ok_or(CatalogError::NoVersions(resource_id))?;
        let pending = VersionStore::mark_pending(&mut tx, latest)?;
        tx.commit().await?;

        info!(version = %pending.version_number, "Validation requested");

        self.publisher
            .publish(CatalogEvent::ValidationRequested {
                resource_id,
                version_id: pending.id,
                owner_id: resource.owner_id,
                requested_by: actor.id,
                title: pending.title.clone(),
            })
            .await;

        Ok(ResourceRecord {
            resource: resource.into_inner(),
            latest_version: pending,
        })
    }
}
