//! Error types for catalog operations
//!
//! Every failure a catalog operation can report to its caller. All of them
//! are recoverable at the API boundary; none is fatal to the process.

use thiserror::Error;
use uuid::Uuid;

use crate::config::ConfigError;
use crate::version::VersionStatus;

/// Catalog error types.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Resource is absent or soft-deleted. The two cases are deliberately
    /// indistinguishable.
    #[error("Resource not found: {0}")]
    ResourceNotFound(Uuid),

    /// Source resource has no latest version to fork from
    #[error("Resource {0} has no versions to fork")]
    NoVersionsToFork(Uuid),

    /// Resource has no latest version
    #[error("Resource {0} has no versions")]
    NoVersions(Uuid),

    /// Version number is not MAJOR.MINOR.PATCH
    #[error("Version must be in format MAJOR.MINOR.PATCH (e.g., 1.0.0), got {0:?}")]
    InvalidVersionFormat(String),

    /// A field required for the resource's source type is missing or blank
    #[error("Missing required field: {field}")]
    MissingRequiredField {
        /// Field name as exposed by the API
        field: &'static str,
    },

    /// A field is present but unacceptable
    #[error("Invalid value for {field}: {reason}")]
    InvalidField {
        /// Field name as exposed by the API
        field: &'static str,
        /// Human-readable reason
        reason: String,
    },

    /// The resource already has a version with this number
    #[error("Version {version} already exists for resource {resource_id}")]
    DuplicateVersion {
        /// Resource ID
        resource_id: Uuid,
        /// Conflicting version number
        version: String,
    },

    /// A published version must be newer than the current latest
    #[error("Version {requested} is not newer than current version {current}")]
    VersionNotNewer {
        /// Current latest version number
        current: String,
        /// Requested version number
        requested: String,
    },

    /// The latest version is already validated
    #[error("Resource {0} is already validated")]
    AlreadyValidated(Uuid),

    /// Status change not allowed by the validation state machine
    #[error("Cannot move version from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: VersionStatus,
        /// Requested status
        to: VersionStatus,
    },

    /// Actor lacks the capability for this operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Storage invariant violated; the operation left no partial state
    #[error("Internal error: {0}")]
    Internal(String),

    /// Catalog settings are unusable
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    /// Check if this error should be logged at error level.
    ///
    /// Missing versions should be unreachable, so seeing one points at a
    /// storage problem rather than a bad request.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            CatalogError::Internal(_)
                | CatalogError::Config(_)
                | CatalogError::NoVersions(_)
                | CatalogError::NoVersionsToFork(_)
        )
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::ResourceNotFound(_) => 404,

            CatalogError::PermissionDenied(_) => 403,

            CatalogError::InvalidVersionFormat(_)
            | CatalogError::MissingRequiredField { .. }
            | CatalogError::InvalidField { .. }
            | CatalogError::VersionNotNewer { .. }
            | CatalogError::AlreadyValidated(_)
            | CatalogError::InvalidTransition { .. } => 400,

            CatalogError::NoVersions(_)
            | CatalogError::NoVersionsToFork(_)
            | CatalogError::DuplicateVersion { .. } => 409,

            CatalogError::Internal(_) | CatalogError::Config(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            CatalogError::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            CatalogError::NoVersionsToFork(_) => "NO_VERSIONS_TO_FORK",
            CatalogError::NoVersions(_) => "NO_VERSIONS",
            CatalogError::InvalidVersionFormat(_) => "INVALID_VERSION_FORMAT",
            CatalogError::MissingRequiredField { .. } => "MISSING_REQUIRED_FIELD",
            CatalogError::InvalidField { .. } => "INVALID_FIELD",
            CatalogError::DuplicateVersion { .. } => "DUPLICATE_VERSION",
            CatalogError::VersionNotNewer { .. } => "VERSION_NOT_NEWER",
            CatalogError::AlreadyValidated(_) => "ALREADY_VALIDATED",
            CatalogError::InvalidTransition { .. } => "INVALID_TRANSITION",
            CatalogError::PermissionDenied(_) => "PERMISSION_DENIED",
            CatalogError::Internal(_) => "INTERNAL_ERROR",
            CatalogError::Config(_) => "INVALID_CONFIG",
        }
    }

    /// The offending field, for validation failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CatalogError::MissingRequiredField { field } | CatalogError::InvalidField { field, .. } => {
                Some(*field)
            }
            CatalogError::InvalidVersionFormat(_)
            | CatalogError::DuplicateVersion { .. }
            | CatalogError::VersionNotNewer { .. } => Some("version_number"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = CatalogError::ResourceNotFound(Uuid::now_v7());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "RESOURCE_NOT_FOUND");
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_validation_errors_are_client_errors() {
        let errors = [
            CatalogError::InvalidVersionFormat("1.0".into()),
            CatalogError::MissingRequiredField { field: "content" },
            CatalogError::AlreadyValidated(Uuid::now_v7()),
            CatalogError::InvalidTransition {
                from: VersionStatus::Validated,
                to: VersionStatus::PendingValidation,
            },
        ];
        for err in errors {
            assert_eq!(err.status_code(), 400, "{err}");
        }
    }

    #[test]
    fn test_integrity_errors() {
        let err = CatalogError::NoVersionsToFork(Uuid::now_v7());
        assert_eq!(err.status_code(), 409);
        assert!(err.is_server_error());
        assert_eq!(CatalogError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_field_names() {
        assert_eq!(CatalogError::MissingRequiredField { field: "repo_url" }.field(), Some("repo_url"));
        assert_eq!(CatalogError::InvalidVersionFormat("v1".into()).field(), Some("version_number"));
        assert_eq!(CatalogError::PermissionDenied("no".into()).field(), None);
    }

    #[test]
    fn test_messages() {
        let err = CatalogError::InvalidTransition {
            from: VersionStatus::Validated,
            to: VersionStatus::Sandbox,
        };
        assert_eq!(err.to_string(), "Cannot move version from Validated to Sandbox");
    }
}
