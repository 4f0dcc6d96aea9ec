//! JWT token generation and validation
//!
//! This module issues and verifies HMAC-signed access/refresh token pairs
//! using the jsonwebtoken crate, and turns a verified access token into the
//! [`Actor`] that catalog operations are performed by.

use crate::claims::{AccessClaims, TokenType, DEFAULT_AUDIENCE, DEFAULT_ISSUER};
use crate::error::{AuthError, AuthResult};
use ccg_rbac::Actor;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::debug;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation};

/// JWT configuration for token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// Shared HMAC secret
    pub secret: Option<String>,

    /// Algorithm to use
    pub algorithm: JwtAlgorithm,

    /// Token issuer
    pub issuer: String,

    /// Token audience
    pub audience: Vec<String>,

    /// Access token duration
    pub access_token_duration: Duration,

    /// Refresh token duration
    pub refresh_token_duration: Duration,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_token_duration", &self.access_token_duration)
            .field("refresh_token_duration", &self.refresh_token_duration)
            .finish()
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            algorithm: JwtAlgorithm::HS256,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: vec![DEFAULT_AUDIENCE.to_string()],
            access_token_duration: Duration::minutes(60),
            refresh_token_duration: Duration::days(1),
        }
    }
}

impl JwtConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `JWT_SECRET`: HMAC signing secret (required to build a service)
    /// - `JWT_ISSUER`: Token issuer (default: ccg-commons)
    /// - `JWT_ACCESS_TOKEN_MINUTES`: Access token lifetime (default: 60)
    /// - `JWT_REFRESH_TOKEN_DAYS`: Refresh token lifetime (default: 1)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            secret: std::env::var("JWT_SECRET").ok().filter(|s| !s.is_empty()),
            issuer: std::env::var("JWT_ISSUER").unwrap_or(default.issuer),
            access_token_duration: std::env::var("JWT_ACCESS_TOKEN_MINUTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::minutes)
                .unwrap_or(default.access_token_duration),
            refresh_token_duration: std::env::var("JWT_REFRESH_TOKEN_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::days)
                .unwrap_or(default.refresh_token_duration),
            ..default
        }
    }

    /// Set the secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the access token lifetime.
    pub fn with_access_token_duration(mut self, duration: Duration) -> Self {
        self.access_token_duration = duration;
        self
    }
}

/// Supported JWT algorithms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
}

impl From<JwtAlgorithm> for Algorithm {
    fn from(alg: JwtAlgorithm) -> Self {
        match alg {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        }
    }
}

/// JWT service for token operations.
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("config", &self.config)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtService {
    /// Create a new JWT service with the given configuration.
    ///
    /// Fails with [`AuthError::ConfigError`] when no secret is configured.
    pub fn new(config: JwtConfig) -> AuthResult<Self> {
        let secret = config
            .secret
            .as_ref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::ConfigError("Secret required for HMAC".to_string()))?;

        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Create with a simple secret (HS256).
    pub fn with_secret(secret: impl Into<String>) -> AuthResult<Self> {
        Self::new(JwtConfig::default().with_secret(secret))
    }

    /// Issue an access/refresh token pair for an actor.
    ///
    /// Callers issue tokens only after the account's email has been
    /// verified, so both tokens carry `email_verified = true`.
    pub fn generate_token_pair(&self, actor: &Actor) -> AuthResult<TokenPair> {
        let access = self.claims_for(actor, self.config.access_token_duration, TokenType::Access);
        let refresh = self.claims_for(actor, self.config.refresh_token_duration, TokenType::Refresh);

        Ok(TokenPair::new(
            self.encode_claims(&access)?,
            self.encode_claims(&refresh)?,
            self.config.access_token_duration.num_seconds(),
        ))
    }

    fn claims_for(&self, actor: &Actor, duration: Duration, token_type: TokenType) -> AccessClaims {
        AccessClaims::for_actor(actor, duration)
            .with_issuer(self.config.issuer.clone())
            .with_audience(self.config.audience.clone())
            .with_token_type(token_type)
    }

    /// Generate a token from existing claims.
    pub fn encode_claims(&self, claims: &AccessClaims) -> AuthResult<String> {
        let header = Header::new(self.config.algorithm.into());
        encode(&header, claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token encoding failed: {}", e)))
    }

    /// Validate and decode a token of either type.
    pub fn validate_token(&self, token: &str) -> AuthResult<AccessClaims> {
        let mut validation = Validation::new(self.config.algorithm.into());
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&self.config.audience);
        validation.leeway = 0;

        let token_data: TokenData<AccessClaims> = decode(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    AuthError::InvalidToken("Malformed token".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                    AuthError::InvalidToken("Invalid signature".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AuthError::InvalidToken("Invalid issuer".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidAudience => {
                    AuthError::InvalidToken("Invalid audience".to_string())
                }
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Resolve a bearer access token into the actor it was issued for.
    ///
    /// Refresh tokens are rejected, as are tokens for unverified accounts.
    pub fn authenticate(&self, token: &str) -> AuthResult<Actor> {
        let claims = self.validate_token(token)?;

        if claims.token_type != TokenType::Access {
            debug!(jti = %claims.jti, "Refresh token presented as bearer token");
            return Err(AuthError::WrongTokenType {
                expected: TokenType::Access.as_str(),
            });
        }
        if !claims.email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        claims.to_actor()
    }

    /// Exchange a refresh token for a fresh access token.
    pub fn refresh_access_token(&self, refresh_token: &str) -> AuthResult<String> {
        let claims = self.validate_token(refresh_token)?;

        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::WrongTokenType {
                expected: TokenType::Refresh.as_str(),
            });
        }

        let actor = claims.to_actor()?;
        let access = self
            .claims_for(&actor, self.config.access_token_duration, TokenType::Access)
            .with_email_verified(claims.email_verified);
        self.encode_claims(&access)
    }

    /// Get the configuration.
    pub fn config(&self) -> &JwtConfig {
        &self.config
    }
}

/// Token pair containing access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token (short-lived)
    pub access_token: String,

    /// Refresh token (long-lived)
    pub refresh_token: String,

    /// Token type (always "Bearer")
    pub token_type: String,

    /// Access token expiration in seconds
    pub expires_in: i64,
}

impl TokenPair {
    /// Create a new token pair.
    pub fn new(access_token: String, refresh_token: String, expires_in: i64) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccg_rbac::Role;
    use uuid::Uuid;

    fn test_secret() -> String {
        "test-secret-key-for-jwt-signing-minimum-32-chars".to_string()
    }

    fn service() -> JwtService {
        JwtService::with_secret(test_secret()).unwrap()
    }

    #[test]
    fn test_jwt_service_requires_secret() {
        let result = JwtService::new(JwtConfig::default());
        assert!(matches!(result, Err(AuthError::ConfigError(_))));
    }

    #[test]
    fn test_token_pair_authenticates_actor() {
        let service = service();
        let actor = Actor::new(Uuid::now_v7())
            .with_email("test@example.com")
            .with_role(Role::Admin);

        let pair = service.generate_token_pair(&actor).unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 3600);

        let authenticated = service.authenticate(&pair.access_token).unwrap();
        assert_eq!(authenticated, actor);
        assert!(authenticated.is_admin());
    }

    #[test]
    fn test_refresh_token_is_not_a_bearer_token() {
        let service = service();
        let pair = service.generate_token_pair(&Actor::new(Uuid::now_v7())).unwrap();

        let result = service.authenticate(&pair.refresh_token);
        assert!(matches!(result, Err(AuthError::WrongTokenType { expected: "access" })));
    }

    #[test]
    fn test_refresh_access_token() {
        let service = service();
        let actor = Actor::new(Uuid::now_v7()).with_role(Role::User);
        let pair = service.generate_token_pair(&actor).unwrap();

        let access = service.refresh_access_token(&pair.refresh_token).unwrap();
        assert_eq!(service.authenticate(&access).unwrap().id, actor.id);

        let result = service.refresh_access_token(&pair.access_token);
        assert!(matches!(result, Err(AuthError::WrongTokenType { expected: "refresh" })));
    }

    #[test]
    fn test_unverified_email_rejected() {
        let service = service();
        let claims = AccessClaims::for_actor(&Actor::new(Uuid::now_v7()), Duration::minutes(5))
            .with_email_verified(false);
        let token = service.encode_claims(&claims).unwrap();

        assert!(matches!(service.authenticate(&token), Err(AuthError::EmailNotVerified)));
    }

    #[test]
    fn test_expired_token() {
        let service = service();
        let mut claims = AccessClaims::for_actor(&Actor::new(Uuid::now_v7()), Duration::minutes(5));
        claims.exp = chrono::Utc::now().timestamp() - 3600;
        let token = service.encode_claims(&claims).unwrap();

        assert!(matches!(service.validate_token(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_invalid_token() {
        let result = service().validate_token("invalid-token");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = JwtService::with_secret("a-completely-different-signing-secret").unwrap();
        let pair = other.generate_token_pair(&Actor::new(Uuid::now_v7())).unwrap();

        let result = service().validate_token(&pair.access_token);
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_config_debug_redacts_secret() {
        let config = JwtConfig::default().with_secret("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
