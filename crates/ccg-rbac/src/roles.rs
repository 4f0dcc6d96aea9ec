//! Roles and their default permission sets.

use serde::{Deserialize, Serialize};

use crate::actions::Action;
use crate::permissions::{Permission, PermissionSet};
use crate::resources::ResourceKind;

/// Role held by a registered user.
///
/// The hierarchy is: User < Admin.
///
/// - **User**: Publishes, forks, and votes on resources; manages their own
///   notifications
/// - **Admin**: Everything a user can do, plus validating and deleting any
///   resource
///
/// # Examples
///
/// ```
/// use ccg_rbac::Role;
///
/// assert!(Role::Admin.is_admin());
/// assert!(!Role::User.is_admin());
/// assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Standard registered user
    User = 1,

    /// Catalog administrator
    Admin = 2,
}

impl Role {
    /// Check if this role has admin privileges.
    pub fn is_admin(&self) -> bool {
        *self >= Role::Admin
    }

    /// Parse role from string representation (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Get the role name as stored in the role table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Admin => "Admin",
        }
    }

    /// Default permissions granted by this role.
    ///
    /// Instance-level rules (an owner updating their own resource) are
    /// decided by the catalog, not by the role.
    pub fn default_permissions(&self) -> PermissionSet {
        let mut set: PermissionSet = [
            Permission::new(ResourceKind::Resource, Action::Read),
            Permission::new(ResourceKind::Resource, Action::List),
            Permission::new(ResourceKind::Resource, Action::Create),
            Permission::new(ResourceKind::Resource, Action::Fork),
            Permission::new(ResourceKind::Version, Action::Read),
            Permission::new(ResourceKind::Vote, Action::Vote),
            Permission::new(ResourceKind::Vote, Action::Read),
            Permission::new(ResourceKind::Notification, Action::Read),
            Permission::new(ResourceKind::Notification, Action::Update),
        ]
        .into_iter()
        .collect();

        if self.is_admin() {
            set.add(Permission::new(ResourceKind::Resource, Action::Manage));
            set.add(Permission::new(ResourceKind::Version, Action::Manage));
            set.add(Permission::new(ResourceKind::User, Action::Read));
        }

        set
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::User
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
