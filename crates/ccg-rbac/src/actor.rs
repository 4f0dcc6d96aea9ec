//! The authenticated caller of a catalog operation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::permissions::{Permission, PermissionSet};
use crate::roles::Role;

/// Identity performing an operation.
///
/// An actor is an administrator when it holds the `Admin` role or carries
/// the superuser capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    /// User ID.
    pub id: Uuid,

    /// Email address, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Roles held by the user.
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Superuser capability, independent of roles.
    #[serde(default)]
    pub is_superuser: bool,
}

impl Actor {
    /// Create an actor with no roles.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            email: None,
            roles: Vec::new(),
            is_superuser: false,
        }
    }

    /// Set the email address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Grant a role. Granting the same role twice is a no-op.
    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    /// Mark the actor as a superuser.
    pub fn superuser(mut self) -> Self {
        self.is_superuser = true;
        self
    }

    /// Check if the actor holds a role.
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Admin role or superuser.
    pub fn is_admin(&self) -> bool {
        self.is_superuser || self.roles.iter().any(Role::is_admin)
    }

    /// Union of the default permissions of every held role.
    pub fn permissions(&self) -> PermissionSet {
        let mut set = PermissionSet::new();
        for role in &self.roles {
            set.merge(&role.default_permissions());
        }
        if self.is_superuser {
            set.merge(&Role::Admin.default_permissions());
        }
        set
    }

    /// Check a permission. Superusers pass every check.
    pub fn can(&self, permission: &Permission) -> bool {
        self.is_superuser || self.permissions().has(permission)
    }

    /// Check whether `owner_id` is this actor.
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.id == owner_id
    }
}
