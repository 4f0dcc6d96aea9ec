//! Error types for authentication operations
//!
//! This module defines the errors that can occur while issuing, validating,
//! and refreshing tokens.

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// JWT token has expired
    #[error("Token has expired")]
    TokenExpired,

    /// JWT token is invalid (malformed, bad signature, etc.)
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Token is missing required claims
    #[error("Missing required claim: {0}")]
    MissingClaim(String),

    /// A refresh token was presented where an access token is required, or
    /// the reverse
    #[error("Wrong token type: expected {expected}")]
    WrongTokenType {
        /// The token type the operation accepts
        expected: &'static str,
    },

    /// The account's email address has not been verified yet
    #[error("Email address not verified")]
    EmailNotVerified,

    /// User is not authorized for this operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User does not have required permissions
    #[error("Forbidden: insufficient permissions")]
    Forbidden,

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Expired or malformed tokens are routine and only worth a debug line.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::Internal(_) | AuthError::ConfigError(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::TokenExpired
            | AuthError::InvalidToken(_)
            | AuthError::MissingClaim(_)
            | AuthError::WrongTokenType { .. }
            | AuthError::Unauthorized(_) => 401,

            AuthError::EmailNotVerified | AuthError::Forbidden => 403,

            AuthError::ConfigError(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::InvalidToken(_) => "INVALID_TOKEN",
            AuthError::MissingClaim(_) => "MISSING_CLAIM",
            AuthError::WrongTokenType { .. } => "WRONG_TOKEN_TYPE",
            AuthError::EmailNotVerified => "EMAIL_NOT_VERIFIED",
            AuthError::Unauthorized(_) => "UNAUTHORIZED",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::ConfigError(_) => "CONFIG_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::TokenExpired.status_code(), 401);
        assert_eq!(AuthError::WrongTokenType { expected: "access" }.status_code(), 401);
        assert_eq!(AuthError::EmailNotVerified.status_code(), 403);
        assert_eq!(AuthError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_server_errors() {
        assert!(AuthError::ConfigError("no secret".into()).is_server_error());
        assert!(!AuthError::InvalidToken("bad".into()).is_server_error());
    }

    #[test]
    fn test_error_message() {
        let err = AuthError::WrongTokenType { expected: "refresh" };
        assert_eq!(err.to_string(), "Wrong token type: expected refresh");
        assert_eq!(err.error_code(), "WRONG_TOKEN_TYPE");
    }
}
