//! # Commons RBAC (Role-Based Access Control)
//!
//! This crate provides role-based access control for the content commons
//! and the `Actor` identity every catalog operation is performed by.
//!
//! ## Overview
//!
//! The ccg-rbac crate handles:
//! - **Resource kinds**: The entities permissions apply to
//! - **Actions**: Operations that can be performed on them
//! - **Permissions**: Kind + Action combinations
//! - **Permission Sets**: Collections of permissions granted by roles
//! - **Roles**: `User` and `Admin`, each with a default permission set
//! - **Actors**: The authenticated caller (id, roles, superuser capability)
//!
//! ## Architecture
//!
//! ```text
//! Permission = ResourceKind + Action [+ instance id]
//!
//! Examples:
//!   "resource:read"              - Read any resource
//!   "resource:fork"              - Fork any visible resource
//!   "resource:validate"          - Validate resources (admin)
//!   "resource:update:<uuid>"     - Update one specific resource
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use ccg_rbac::{Action, Actor, Permission, ResourceKind, Role};
//! use uuid::Uuid;
//!
//! let admin = Actor::new(Uuid::now_v7()).with_role(Role::Admin);
//! assert!(admin.is_admin());
//! assert!(admin.can(&Permission::new(ResourceKind::Resource, Action::Validate)));
//!
//! let user = Actor::new(Uuid::now_v7()).with_role(Role::User);
//! assert!(!user.can(&Permission::new(ResourceKind::Resource, Action::Validate)));
//! assert!(user.can(&Permission::new(ResourceKind::Resource, Action::Fork)));
//! ```
//!
//! ## Action Implications
//!
//! Some actions imply others:
//! - `Manage` implies all actions
//! - `Update`, `Delete` imply `Read`

pub mod actions;
pub mod actor;
pub mod permissions;
pub mod resources;
pub mod roles;

// Re-export main types for convenience
pub use actions::Action;
pub use actor::Actor;
pub use permissions::{Permission, PermissionSet};
pub use resources::ResourceKind;
pub use roles::Role;
