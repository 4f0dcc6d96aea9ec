//! # Actions
//!
//! Defines the operations that can be performed on catalog entities.

use serde::{Deserialize, Serialize};

/// Actions that can be performed on catalog entities.
///
/// - **Read**: View a resource, its versions, or its lineage
/// - **List**: Browse and search the catalog
/// - **Create**: Publish a new resource
/// - **Update**: Publish a new version or request validation
/// - **Delete**: Soft-delete a resource
/// - **Fork**: Derive a new resource from an existing one
/// - **Vote**: Cast or withdraw a vote
/// - **Validate**: Mark a resource's latest version as validated
/// - **Manage**: Full administrative access
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read/view an entity.
    Read,

    /// List/query entities.
    List,

    /// Create a new entity.
    Create,

    /// Modify an existing entity.
    Update,

    /// Soft-delete an entity.
    Delete,

    /// Fork an entity into a new, independently owned copy.
    Fork,

    /// Cast or withdraw a vote.
    Vote,

    /// Approve content as validated.
    ///
    /// Granted to administrators only by default.
    Validate,

    /// Administer everything.
    Manage,
}

impl Action {
    /// Get the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::List => "list",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Fork => "fork",
            Action::Vote => "vote",
            Action::Validate => "validate",
            Action::Manage => "manage",
        }
    }

    /// Parse action from string representation.
    ///
    /// Accepts a handful of aliases used by the web layer.
    ///
    /// # Example
    ///
    /// ```
    /// use ccg_rbac::actions::Action;
    ///
    /// assert_eq!(Action::parse("read"), Some(Action::Read));
    /// assert_eq!(Action::parse("view"), Some(Action::Read));
    /// assert_eq!(Action::parse("approve"), Some(Action::Validate));
    /// assert_eq!(Action::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "read" | "view" | "get" => Some(Action::Read),
            "list" | "browse" | "search" => Some(Action::List),
            "create" | "publish" => Some(Action::Create),
            "update" | "edit" => Some(Action::Update),
            "delete" | "remove" => Some(Action::Delete),
            "fork" | "reuse" => Some(Action::Fork),
            "vote" => Some(Action::Vote),
            "validate" | "approve" => Some(Action::Validate),
            "manage" | "admin" => Some(Action::Manage),
            _ => None,
        }
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![
            Action::Read,
            Action::List,
            Action::Create,
            Action::Update,
            Action::Delete,
            Action::Fork,
            Action::Vote,
            Action::Validate,
            Action::Manage,
        ]
    }

    /// Check if this action implies another action.
    ///
    /// - `Manage` implies all other actions
    /// - `Update` and `Delete` imply `Read`
    ///
    /// # Example
    ///
    /// ```
    /// use ccg_rbac::actions::Action;
    ///
    /// assert!(Action::Manage.implies(Action::Validate));
    /// assert!(Action::Update.implies(Action::Read));
    /// assert!(!Action::Fork.implies(Action::Update));
    /// ```
    pub fn implies(&self, other: Action) -> bool {
        match self {
            Action::Manage => true,
            Action::Update | Action::Delete => other == Action::Read,
            _ => false,
        }
    }

    /// Check if this action changes stored state.
    pub fn is_write(&self) -> bool {
        !matches!(self, Action::Read | Action::List)
    }

    /// Check if repeating this action has additional effects.
    ///
    /// Forking twice yields two forks and validating twice is rejected, so
    /// callers must not retry these blindly.
    pub fn is_idempotent(&self) -> bool {
        !matches!(self, Action::Fork | Action::Validate | Action::Vote)
    }
}
