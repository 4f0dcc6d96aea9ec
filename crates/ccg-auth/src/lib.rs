//! # Commons Authentication
//!
//! This crate issues and verifies the JWTs used by the content commons API.
//!
//! ## Overview
//!
//! The ccg-auth crate handles:
//! - **JWT**: Access/refresh token pairs signed with a shared HMAC secret
//! - **Claims**: User id, email, roles, and superuser capability
//! - **Actors**: Resolving a verified access token into a `ccg_rbac::Actor`
//!
//! ## Features
//!
//! - `jwt` (default): JWT token support using jsonwebtoken
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ccg_auth::JwtService;
//! use ccg_rbac::{Actor, Role};
//! use uuid::Uuid;
//!
//! let service = JwtService::with_secret("your-secret-key").unwrap();
//!
//! let actor = Actor::new(Uuid::now_v7()).with_role(Role::User);
//! let pair = service.generate_token_pair(&actor).unwrap();
//!
//! let authenticated = service.authenticate(&pair.access_token).unwrap();
//! assert_eq!(authenticated.id, actor.id);
//! ```

pub mod claims;
pub mod error;
#[cfg(feature = "jwt")]
pub mod jwt;

// Re-export main types
pub use claims::{AccessClaims, TokenType};
pub use error::{AuthError, AuthResult};

#[cfg(feature = "jwt")]
pub use jwt::{JwtAlgorithm, JwtConfig, JwtService, TokenPair};
