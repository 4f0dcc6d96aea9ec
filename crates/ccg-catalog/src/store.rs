//! Transactional in-memory storage
//!
//! [`MemoryStore`] holds the committed resource and version rows. All writes
//! go through a [`Transaction`], which stages them privately and applies them
//! in one step on [`Transaction::commit`]. A transaction that is dropped
//! without committing leaves the store untouched.
//!
//! ## Row locks
//!
//! Each resource has an exclusive row lock. [`Transaction::lock_live_resource`]
//! acquires it and holds it until the transaction ends, which serializes
//! validate, fork, publish and delete on the same resource. Only one row lock
//! is taken per operation, so lock ordering never comes into play.
//!
//! Writes to an existing resource or its versions are refused unless the
//! transaction holds that resource's row lock.
//!
//! ## Commit checks
//!
//! Before anything is applied, commit verifies for every touched resource
//! that it exists, has at least one version, has unique version numbers, and
//! has exactly one latest version. Inserted resources must not collide with
//! a committed row. Content hashes of staged versions are recomputed from
//! their content, so a hash never disagrees with what it covers.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::error;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::hasher::ContentHasher;
use crate::resource::{LiveResource, Resource, SourceType};
use crate::version::ResourceVersion;

/// Committed row with its insertion sequence, used to break timestamp ties.
#[derive(Debug, Clone)]
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Debug, Default)]
struct StoreState {
    resources: HashMap<Uuid, Row<Resource>>,
    /// Versions keyed by resource ID
    versions: HashMap<Uuid, Vec<Row<ResourceVersion>>>,
}

impl StoreState {
    fn latest_version(&self, resource_id: Uuid) -> Option<&ResourceVersion> {
        self.versions
            .get(&resource_id)?
            .iter()
            .map(|row| &row.value)
            .find(|v| v.is_latest)
    }
}

/// In-memory resource and version storage.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    row_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
    seq: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a transaction.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction {
            store: self,
            guards: HashMap::new(),
            inserted_resources: HashSet::new(),
            staged_resources: HashMap::new(),
            inserted_versions: HashSet::new(),
            staged_versions: HashMap::new(),
            fork_increments: HashMap::new(),
        }
    }

    /// Fetch a resource that is present and not soft-deleted.
    pub async fn live_resource(&self, id: Uuid) -> CatalogResult<LiveResource> {
        let state = self.state.read().await;
        state
            .resources
            .get(&id)
            .and_then(|row| LiveResource::new(row.value.clone()))
            .ok_or(CatalogError::ResourceNotFound(id))
    }

    /// Check whether a resource is present and not soft-deleted.
    pub async fn is_live(&self, id: Uuid) -> bool {
        let state = self.state.read().await;
        state.resources.get(&id).is_some_and(|row| !row.value.is_deleted())
    }

    /// The latest version of a resource.
    pub async fn latest_version(&self, resource_id: Uuid) -> Option<ResourceVersion> {
        let state = self.state.read().await;
        state.latest_version(resource_id).cloned()
    }

    /// All versions of a resource, newest created first.
    pub async fn versions(&self, resource_id: Uuid) -> Vec<ResourceVersion> {
        let state = self.state.read().await;
        let mut rows: Vec<&Row<ResourceVersion>> = state
            .versions
            .get(&resource_id)
            .map(|rows| rows.iter().collect())
            .unwrap_or_default();

        rows.sort_by(|a, b| {
            b.value
                .created_at
                .cmp(&a.value.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        rows.into_iter().map(|row| row.value.clone()).collect()
    }

    /// Snapshot of every visible resource paired with its latest version.
    ///
    /// Taken under a single read lock, so each pair is consistent. Each
    /// resource appears once.
    pub async fn live_listing(&self) -> Vec<(LiveResource, ResourceVersion)> {
        let state = self.state.read().await;
        let mut rows: Vec<&Row<Resource>> = state
            .resources
            .values()
            .filter(|row| !row.value.is_deleted())
            .collect();
        rows.sort_by_key(|row| row.seq);

        rows.into_iter()
            .filter_map(|row| {
                let latest = state.latest_version(row.value.id);
                if latest.is_none() {
                    error!(resource_id = %row.value.id, "Visible resource has no latest version");
                }
                let live = LiveResource::new(row.value.clone())?;
                Some((live, latest?.clone()))
            })
            .collect()
    }

    /// Visible direct forks of a resource, newest first.
    pub async fn forks_of(&self, parent_id: Uuid) -> Vec<LiveResource> {
        let state = self.state.read().await;
        let mut rows: Vec<&Row<Resource>> = state
            .resources
            .values()
            .filter(|row| row.value.derived_from_resource == Some(parent_id))
            .collect();

        rows.sort_by(|a, b| {
            b.value
                .created_at
                .cmp(&a.value.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        rows.into_iter()
            .filter_map(|row| LiveResource::new(row.value.clone()))
            .collect()
    }

    /// Number of stored resources, soft-deleted ones included.
    pub async fn resource_count(&self) -> usize {
        self.state.read().await.resources.len()
    }

    /// Number of stored versions across all resources.
    pub async fn version_count(&self) -> usize {
        self.state.read().await.versions.values().map(Vec::len).sum()
    }

    async fn row_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.row_locks.lock().await;
        locks.entry(id).or_default().clone()
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Insert a resource with no versions, bypassing commit checks.
    #[cfg(test)]
    pub(crate) async fn insert_bare_resource(&self, resource: Resource) {
        let seq = self.next_seq();
        let mut state = self.state.write().await;
        state.resources.insert(resource.id, Row { seq, value: resource });
    }
}

/// A unit of work against a [`MemoryStore`].
///
/// Reads see committed rows overlaid with this transaction's own staged
/// writes.
pub struct Transaction<'a> {
    store: &'a MemoryStore,
    guards: HashMap<Uuid, OwnedMutexGuard<()>>,
    inserted_resources: HashSet<Uuid>,
    staged_resources: HashMap<Uuid, Resource>,
    inserted_versions: HashSet<Uuid>,
    /// Staged versions keyed by version ID
    staged_versions: HashMap<Uuid, ResourceVersion>,
    fork_increments: HashMap<Uuid, u64>,
}

impl std::fmt::Debug for Transaction<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("locked", &self.guards.keys().collect::<Vec<_>>())
            .field("staged_resources", &self.staged_resources.len())
            .field("staged_versions", &self.staged_versions.len())
            .field("fork_increments", &self.fork_increments)
            .finish()
    }
}

impl<'a> Transaction<'a> {
    /// Acquire the row lock for a resource and read it.
    ///
    /// The lock is held until the transaction commits or is dropped. Fails
    /// with `ResourceNotFound` if the resource is absent or soft-deleted.
    pub async fn lock_live_resource(&mut self, id: Uuid) -> CatalogResult<LiveResource> {
        if !self.guards.contains_key(&id) {
            let lock = self.store.row_lock(id).await;
            let guard = lock.lock_owned().await;
            self.guards.insert(id, guard);
        }

        self.resource(id)
            .await
            .and_then(LiveResource::new)
            .ok_or(CatalogError::ResourceNotFound(id))
    }

    /// Read a resource, including soft-deleted ones.
    pub async fn resource(&self, id: Uuid) -> Option<Resource> {
        let mut resource = match self.staged_resources.get(&id) {
            Some(staged) => staged.clone(),
            None => {
                let state = self.store.state.read().await;
                state.resources.get(&id)?.value.clone()
            }
        };
        resource.forks_count += self.fork_increments.get(&id).copied().unwrap_or(0);
        Some(resource)
    }

    /// All versions of a resource as this transaction sees them.
    pub async fn versions_of(&self, resource_id: Uuid) -> Vec<ResourceVersion> {
        let state = self.store.state.read().await;
        self.merged_versions(&state, resource_id)
    }

    /// The latest version of a resource as this transaction sees it.
    pub async fn latest_version(&self, resource_id: Uuid) -> Option<ResourceVersion> {
        self.versions_of(resource_id).await.into_iter().find(|v| v.is_latest)
    }

    /// Stage a new resource.
    pub fn insert_resource(&mut self, resource: Resource) {
        self.inserted_resources.insert(resource.id);
        self.staged_resources.insert(resource.id, resource);
    }

    /// Stage changes to an existing resource.
    ///
    /// Requires the row lock from [`Transaction::lock_live_resource`].
    /// `forks_count` is not taken from `resource`; counters change only
    /// through [`Transaction::increment_forks`].
    pub fn update_resource(&mut self, resource: Resource) -> CatalogResult<()> {
        self.ensure_writable(resource.id)?;
        self.staged_resources.insert(resource.id, resource);
        Ok(())
    }

    /// Stage a new version. The resource must be inserted or locked by this
    /// transaction.
    pub fn insert_version(&mut self, version: ResourceVersion) -> CatalogResult<()> {
        self.ensure_writable(version.resource_id)?;
        self.inserted_versions.insert(version.id);
        self.staged_versions.insert(version.id, version);
        Ok(())
    }

    /// Stage changes to a version. Same locking rule as
    /// [`Transaction::insert_version`].
    pub fn update_version(&mut self, version: ResourceVersion) -> CatalogResult<()> {
        self.ensure_writable(version.resource_id)?;
        self.staged_versions.insert(version.id, version);
        Ok(())
    }

    /// Stage `forks_count += 1`, applied against the committed value.
    pub fn increment_forks(&mut self, resource_id: Uuid) {
        *self.fork_increments.entry(resource_id).or_insert(0) += 1;
    }

    /// Check invariants and apply every staged write at once.
    pub async fn commit(mut self) -> CatalogResult<()> {
        let store = self.store;
        let mut state = store.state.write().await;

        let touched: HashSet<Uuid> = self
            .staged_resources
            .keys()
            .copied()
            .chain(self.staged_versions.values().map(|v| v.resource_id))
            .chain(self.fork_increments.keys().copied())
            .collect();

        for &resource_id in &touched {
            self.check_resource(&state, resource_id)?;
        }
        self.rehash_staged_versions(&state);

        for (id, staged) in &self.staged_resources {
            let increments = self.fork_increments.get(id).copied().unwrap_or(0);
            match state.resources.get_mut(id) {
                Some(row) if !self.inserted_resources.contains(id) => {
                    let forks_count = row.value.forks_count + increments;
                    row.value = Resource {
                        forks_count,
                        ..staged.clone()
                    };
                }
                _ => {
                    let mut value = staged.clone();
                    value.forks_count += increments;
                    let seq = self.store.next_seq();
                    state.resources.insert(*id, Row { seq, value });
                }
            }
        }

        for (id, increments) in &self.fork_increments {
            if self.staged_resources.contains_key(id) {
                continue;
            }
            if let Some(row) = state.resources.get_mut(id) {
                row.value.forks_count += increments;
            }
        }

        for (id, staged) in &self.staged_versions {
            let rows = state.versions.entry(staged.resource_id).or_default();
            if self.inserted_versions.contains(id) {
                let seq = self.store.next_seq();
                rows.push(Row {
                    seq,
                    value: staged.clone(),
                });
            } else if let Some(row) = rows.iter_mut().find(|row| row.value.id == *id) {
                row.value = staged.clone();
            }
        }

        Ok(())
    }

    fn merged_versions(&self, state: &StoreState, resource_id: Uuid) -> Vec<ResourceVersion> {
        let mut versions: Vec<ResourceVersion> = state
            .versions
            .get(&resource_id)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        self.staged_versions
                            .get(&row.value.id)
                            .cloned()
                            .unwrap_or_else(|| row.value.clone())
                    })
                    .collect()
            })
            .unwrap_or_default();

        versions.extend(
            self.staged_versions
                .values()
                .filter(|v| v.resource_id == resource_id && self.inserted_versions.contains(&v.id))
                .cloned(),
        );
        versions
    }

    fn ensure_writable(&self, resource_id: Uuid) -> CatalogResult<()> {
        if self.inserted_resources.contains(&resource_id) || self.guards.contains_key(&resource_id) {
            return Ok(());
        }
        error!(%resource_id, "Write refused: resource row is not locked by this transaction");
        Err(CatalogError::Internal(format!(
            "resource {} is not locked by this transaction",
            resource_id
        )))
    }

    fn rehash_staged_versions(&mut self, state: &StoreState) {
        for version in self.staged_versions.values_mut() {
            let source_type = self
                .staged_resources
                .get(&version.resource_id)
                .map(|r| r.source_type)
                .or_else(|| state.resources.get(&version.resource_id).map(|row| row.value.source_type));

            version.content_hash = match source_type {
                Some(SourceType::Internal) => ContentHasher::hash(version.content.as_deref()),
                _ => None,
            };
        }
    }

    fn check_resource(&self, state: &StoreState, resource_id: Uuid) -> CatalogResult<()> {
        if self.inserted_resources.contains(&resource_id) && state.resources.contains_key(&resource_id) {
            return Err(CatalogError::Internal(format!("resource {} already exists", resource_id)));
        }

        let exists = self.staged_resources.contains_key(&resource_id) || state.resources.contains_key(&resource_id);
        if !exists {
            return Err(CatalogError::ResourceNotFound(resource_id));
        }

        let versions = self.merged_versions(state, resource_id);
        if versions.is_empty() {
            return Err(CatalogError::NoVersions(resource_id));
        }

        let mut numbers = HashSet::new();
        for version in &versions {
            if !numbers.insert(version.version_number.as_str()) {
                return Err(CatalogError::DuplicateVersion {
                    resource_id,
                    version: version.version_number.clone(),
                });
            }
        }

        let latest = versions.iter().filter(|v| v.is_latest).count();
        if latest != 1 {
            error!(%resource_id, latest, "Commit rejected: latest-version invariant violated");
            return Err(CatalogError::Internal(format!(
                "resource {} would have {} latest versions",
                resource_id, latest
            )));
        }

        Ok(())
    }
}
