//! # Commons Resource Catalog
//!
//! Versioned, forkable resources (prompts, workflows, notebooks, datasets,
//! tools) with fork lineage and an admin validation workflow.
//!
//! ## Overview
//!
//! The ccg-catalog crate handles:
//! - **Resources**: Owned catalog entries, soft-deleted rather than removed
//! - **Versions**: Append-only snapshots with a single latest version
//! - **Lineage**: Forks, forks of forks, and fork counts
//! - **Validation**: `Sandbox -> Pending Validation -> Validated`
//! - **Queries**: Filtering, search, ordering and pagination
//! - **Votes**: One vote per user per resource
//!
//! ## Architecture
//!
//! ```text
//! ResourceCatalog
//!   ├─ VersionStore ──→ ContentHasher
//!   ├─ LineageTracker ─→ VersionStore
//!   ├─ ValidationWorkflow ─→ VersionStore
//!   └─ MemoryStore (transactions, row locks)
//!
//! Resource (forks_count, derived_from_resource)
//!   └─ ResourceVersion 1.0.0, 1.1.0, ... (exactly one is_latest)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ccg_catalog::{CatalogConfig, MemoryStore, NewResource, ResourceCatalog, ResourceType, VersionFields};
//! use ccg_events::MemoryEventBus;
//! use ccg_rbac::{Actor, Role};
//! use uuid::Uuid;
//!
//! async fn example() -> ccg_catalog::CatalogResult<()> {
//!     let catalog = ResourceCatalog::new(Arc::new(MemoryStore::new()), CatalogConfig::default())?
//!         .with_event_bus(Arc::new(MemoryEventBus::new()));
//!
//!     let owner = Actor::new(Uuid::now_v7()).with_role(Role::User);
//!     let admin = Actor::new(Uuid::now_v7()).with_role(Role::Admin);
//!
//!     let record = catalog
//!         .create(
//!             &owner,
//!             NewResource::internal(
//!                 VersionFields::new("Reviewer", "Reviews code", ResourceType::Prompt)
//!                     .with_content("Review this diff."),
//!             ),
//!         )
//!         .await?;
//!
//!     catalog.request_validation(&owner, record.resource.id).await?;
//!     catalog.validate(&admin, record.resource.id).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Cross-Crate Integration
//!
//! This crate is designed to work with:
//! - `ccg-rbac`: Actors, roles and permissions
//! - `ccg-auth`: Turning bearer tokens into actors
//! - `ccg-events`: Event bus and notifications for catalog events

mod access;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hasher;
pub mod lineage;
pub mod publisher;
pub mod query;
pub mod resource;
pub mod store;
pub mod validation;
pub mod version;
pub mod versions;
pub mod view;
pub mod votes;

// Re-export main types for convenience
pub use catalog::ResourceCatalog;
pub use config::{CatalogConfig, ConfigError};
pub use error::{CatalogError, CatalogResult};
pub use hasher::ContentHasher;
pub use lineage::{ForkOutcome, LineageTracker};
pub use publisher::EventPublisher;
pub use query::{ListParams, ListQuery, Ordering, Page, ResourceFilters};
pub use resource::{LiveResource, NewResource, Resource, SourceType};
pub use store::{MemoryStore, Transaction};
pub use validation::ValidationWorkflow;
pub use version::{pid, ResourceType, ResourceVersion, VersionFields, VersionNumber, VersionStatus};
pub use versions::VersionStore;
pub use view::{ForkReceipt, ResourceRecord, ResourceView, ValidationReceipt, VersionSummary};
pub use votes::{VoteAction, VoteCounter, VoteLedger, VoteOutcome};
