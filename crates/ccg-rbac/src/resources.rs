//! # Resource Kinds
//!
//! Defines the entity kinds permissions can be granted on.

use serde::{Deserialize, Serialize};

/// Entity kinds that can have permissions assigned.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Catalog resources (the container for versions).
    Resource,
    /// Individual resource versions.
    Version,
    /// Votes cast on resources.
    Vote,
    /// In-app notifications.
    Notification,
    /// User accounts.
    User,
}

impl ResourceKind {
    /// Get the string representation of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Resource => "resource",
            ResourceKind::Version => "version",
            ResourceKind::Vote => "vote",
            ResourceKind::Notification => "notification",
            ResourceKind::User => "user",
        }
    }

    /// Parse a kind from its string representation.
    ///
    /// # Example
    ///
    /// ```
    /// use ccg_rbac::resources::ResourceKind;
    ///
    /// assert_eq!(ResourceKind::parse("resource"), Some(ResourceKind::Resource));
    /// assert_eq!(ResourceKind::parse("resource_version"), Some(ResourceKind::Version));
    /// assert_eq!(ResourceKind::parse("document"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "resource" => Some(ResourceKind::Resource),
            "version" | "resource_version" => Some(ResourceKind::Version),
            "vote" => Some(ResourceKind::Vote),
            "notification" => Some(ResourceKind::Notification),
            "user" => Some(ResourceKind::User),
            _ => None,
        }
    }

    /// All kinds, in declaration order.
    pub fn all() -> &'static [ResourceKind] {
        &[
            ResourceKind::Resource,
            ResourceKind::Version,
            ResourceKind::Vote,
            ResourceKind::Notification,
            ResourceKind::User,
        ]
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_kinds() {
        for kind in ResourceKind::all() {
            assert_eq!(ResourceKind::parse(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(ResourceKind::parse("Resource"), Some(ResourceKind::Resource));
        assert_eq!(ResourceKind::parse("VOTE"), Some(ResourceKind::Vote));
    }
}
