//! JWT claims for commons authentication
//!
//! Access and refresh tokens share one claims structure. The claims carry
//! enough identity to rebuild an [`Actor`] without a user lookup.

use ccg_rbac::{Actor, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};

/// Default issuer written into every token.
pub const DEFAULT_ISSUER: &str = "ccg-commons";

/// Default audience accepted by the commons API.
pub const DEFAULT_AUDIENCE: &str = "ccg-commons-api";

/// Standard JWT claims with commons-specific extensions.
///
/// # Example
///
/// ```
/// use ccg_auth::claims::AccessClaims;
/// use ccg_rbac::{Actor, Role};
/// use uuid::Uuid;
///
/// let actor = Actor::new(Uuid::now_v7())
///     .with_email("ada@example.org")
///     .with_role(Role::Admin);
/// let claims = AccessClaims::for_actor(&actor, chrono::Duration::minutes(15));
///
/// assert_eq!(claims.to_actor().unwrap(), actor);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    // Standard JWT claims (RFC 7519)
    /// Subject (user ID)
    pub sub: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: Vec<String>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// JWT ID (unique identifier for this token)
    pub jti: String,

    // Commons claims
    /// User email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// User display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Email verified status
    #[serde(default)]
    pub email_verified: bool,

    /// Roles held by the user
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Superuser capability
    #[serde(default)]
    pub is_superuser: bool,

    /// Token type (access or refresh)
    #[serde(default)]
    pub token_type: TokenType,
}

impl AccessClaims {
    /// Create claims describing `actor`, valid for `duration` from now.
    pub fn for_actor(actor: &Actor, duration: chrono::Duration) -> Self {
        let now = Utc::now();
        let exp = now + duration;

        Self {
            sub: actor.id.to_string(),
            iss: DEFAULT_ISSUER.to_string(),
            aud: vec![DEFAULT_AUDIENCE.to_string()],
            exp: exp.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: Uuid::now_v7().to_string(),
            email: actor.email.clone(),
            name: None,
            email_verified: true,
            roles: actor.roles.clone(),
            is_superuser: actor.is_superuser,
            token_type: TokenType::Access,
        }
    }

    /// Get the user ID as UUID.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    /// Check if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Get expiration as DateTime.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// Rebuild the actor these claims describe.
    pub fn to_actor(&self) -> AuthResult<Actor> {
        let id = self
            .user_id()
            .ok_or_else(|| AuthError::MissingClaim("sub".to_string()))?;

        let mut actor = Actor::new(id);
        actor.email = self.email.clone();
        for role in &self.roles {
            actor = actor.with_role(*role);
        }
        actor.is_superuser = self.is_superuser;
        Ok(actor)
    }

    /// Set the issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.iss = issuer.into();
        self
    }

    /// Set the audience.
    pub fn with_audience(mut self, audience: Vec<String>) -> Self {
        self.aud = audience;
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set email verified status.
    pub fn with_email_verified(mut self, verified: bool) -> Self {
        self.email_verified = verified;
        self
    }

    /// Set the token type.
    pub fn with_token_type(mut self, token_type: TokenType) -> Self {
        self.token_type = token_type;
        self
    }
}

/// Token type enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    /// Access token (short-lived)
    #[default]
    Access,

    /// Refresh token (long-lived)
    Refresh,
}

impl TokenType {
    /// Get the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}
