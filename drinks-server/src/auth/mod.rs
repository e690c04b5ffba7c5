//! Authentication and authorization
//!
//! - [`TokenVerifier`] - bearer token verification against trusted keys
//! - [`authorize`] - permission check on a verified claim set
//! - [`require_permission`] - middleware composing both in front of a route

pub mod guard;
pub mod jwt;
pub mod keys;
pub mod middleware;
pub mod permissions;

pub use guard::authorize;
pub use jwt::{AuthError, ClaimSet, JwtConfig, TokenVerifier, extract_bearer};
pub use keys::{KeySetError, KeySource, RemoteJwks, StaticKeySet, TrustedKey};
pub use middleware::require_permission;
