//! # Permissions
//!
//! A permission combines a resource kind with an action, optionally scoped
//! to one instance.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::actions::Action;
use crate::resources::ResourceKind;

/// A permission is a combination of resource kind and action.
///
/// Permissions can be:
/// - **Global**: Apply to every instance of a kind (no `instance_id`)
/// - **Instance-specific**: Apply to one instance only
///
/// # Example
///
/// ```
/// use ccg_rbac::{Action, Permission, ResourceKind};
///
/// let perm = Permission::new(ResourceKind::Resource, Action::Fork);
/// assert_eq!(perm.to_string(), "resource:fork");
///
/// let perm = Permission::for_instance(ResourceKind::Resource, Action::Update, "abc");
/// assert_eq!(perm.to_string(), "resource:update:abc");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Permission {
    /// The kind this permission applies to.
    pub kind: ResourceKind,
    /// The action allowed.
    pub action: Action,
    /// Specific instance this permission is limited to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
}

impl Permission {
    /// Create a new global permission.
    pub fn new(kind: ResourceKind, action: Action) -> Self {
        Self {
            kind,
            action,
            instance_id: None,
        }
    }

    /// Create a permission limited to one instance.
    pub fn for_instance(kind: ResourceKind, action: Action, instance_id: impl Into<String>) -> Self {
        Self {
            kind,
            action,
            instance_id: Some(instance_id.into()),
        }
    }

    /// Parse from string (e.g., "resource:read" or "resource:update:<uuid>").
    ///
    /// # Example
    ///
    /// ```
    /// use ccg_rbac::{Action, Permission, ResourceKind};
    ///
    /// let perm = Permission::parse("resource:validate").unwrap();
    /// assert_eq!(perm.kind, ResourceKind::Resource);
    /// assert_eq!(perm.action, Action::Validate);
    /// assert!(Permission::parse("resource").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(3, ':');
        let kind = ResourceKind::parse(parts.next()?)?;
        let action = Action::parse(parts.next()?)?;
        let instance_id = parts.next().map(str::to_string);

        Some(Self {
            kind,
            action,
            instance_id,
        })
    }

    /// Check if this permission grants `other`.
    ///
    /// Kinds must be equal, the action must match or imply the other, and a
    /// global permission covers every instance.
    pub fn grants(&self, other: &Permission) -> bool {
        if self.kind != other.kind {
            return false;
        }

        if self.action != other.action && !self.action.implies(other.action) {
            return false;
        }

        match (&self.instance_id, &other.instance_id) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a == b,
        }
    }

    /// Check if this is a global permission.
    pub fn is_global(&self) -> bool {
        self.instance_id.is_none()
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.instance_id {
            Some(id) => write!(f, "{}:{}:{}", self.kind.as_str(), self.action.as_str(), id),
            None => write!(f, "{}:{}", self.kind.as_str(), self.action.as_str()),
        }
    }
}

/// A set of permissions granted to a role or actor.
///
/// # Example
///
/// ```
/// use ccg_rbac::{Action, Permission, PermissionSet, ResourceKind};
///
/// let mut set = PermissionSet::new();
/// set.add(Permission::new(ResourceKind::Resource, Action::Update));
///
/// // Update implies Read
/// assert!(set.has(&Permission::new(ResourceKind::Resource, Action::Read)));
/// assert!(!set.has(&Permission::new(ResourceKind::Resource, Action::Validate)));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionSet {
    permissions: HashSet<Permission>,
}

impl PermissionSet {
    /// Create a new empty permission set.
    pub fn new() -> Self {
        Self {
            permissions: HashSet::new(),
        }
    }

    /// Add a permission to the set.
    pub fn add(&mut self, permission: Permission) {
        self.permissions.insert(permission);
    }

    /// Remove a permission, returning whether it was present.
    pub fn remove(&mut self, permission: &Permission) -> bool {
        self.permissions.remove(permission)
    }

    /// Check if the set grants a permission, directly, by wildcard, or by
    /// action implication.
    pub fn has(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
            || self.permissions.iter().any(|granted| granted.grants(permission))
    }

    /// Merge another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().cloned());
    }

    /// Create from a list of permission strings, skipping unparseable ones.
    pub fn from_strings(perms: &[&str]) -> Self {
        perms.iter().filter_map(|p| Permission::parse(p)).collect()
    }

    /// Iterate over the permissions in the set.
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Get the count of permissions.
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<T: IntoIterator<Item = Permission>>(iter: T) -> Self {
        Self {
            permissions: iter.into_iter().collect(),
        }
    }
}
