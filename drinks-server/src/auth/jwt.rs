//! Bearer token verification
//!
//! Pulls the token out of the `Authorization` header, resolves its signing
//! key by `kid` and validates signature, expiry, issuer and audience.

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Validation, decode, decode_header};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::keys::KeySource;

const MSG_BEARER_PREFIX: &str = "Authorization header must start with \"Bearer\".";
const MSG_TOKEN_NOT_FOUND: &str = "Token not found.";
const MSG_NOT_BEARER_TOKEN: &str = "Authorization header must be bearer token.";
const MSG_MALFORMED: &str = "Authorization malformed.";
const MSG_NO_KEY: &str = "Unable to find the appropriate key.";
const MSG_UNPARSEABLE: &str = "Unable to parse authentication token.";
const MSG_BAD_CLAIMS: &str = "Incorrect claims. Please, check the audience and issuer.";

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Expected `iss` claim
    pub issuer: String,
    /// Expected `aud` claim
    pub audience: String,
    /// Identity provider key set location
    pub jwks_url: Option<String>,
    /// Pinned RS256 public key modulus (base64url), used when no JWKS is configured
    pub public_key_n: Option<String>,
    /// Pinned RS256 public key exponent (base64url)
    pub public_key_e: Option<String>,
    /// Development-only HMAC secret, used when no JWKS or pinned key is configured
    pub secret: Option<String>,
    /// `kid` under which the pinned key or the development secret is registered
    pub kid: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: "drinks-dev".to_string(),
            audience: "drinks".to_string(),
            jwks_url: None,
            public_key_n: None,
            public_key_e: None,
            secret: None,
            kid: "dev".to_string(),
        }
    }
}

impl JwtConfig {
    /// Load from environment variables
    ///
    /// | Variable | Effect |
    /// |----------|--------|
    /// | AUTH0_DOMAIN | issuer `https://<domain>/`, JWKS `https://<domain>/.well-known/jwks.json` |
    /// | JWT_ISSUER | overrides the issuer |
    /// | JWKS_URL | overrides the key set location |
    /// | API_AUDIENCE | expected audience |
    /// | JWT_PUBLIC_KEY_N / JWT_PUBLIC_KEY_E | pinned RS256 key under JWT_KID |
    /// | JWT_SECRET / JWT_KID | development HMAC key |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let domain = std::env::var("AUTH0_DOMAIN")
            .ok()
            .map(|d| d.trim_end_matches('/').to_string())
            .filter(|d| !d.is_empty());

        let issuer = std::env::var("JWT_ISSUER")
            .ok()
            .or_else(|| domain.as_ref().map(|d| format!("https://{d}/")))
            .unwrap_or(defaults.issuer);
        let jwks_url = std::env::var("JWKS_URL")
            .ok()
            .or_else(|| {
                domain
                    .as_ref()
                    .map(|d| format!("https://{d}/.well-known/jwks.json"))
            });

        Self {
            issuer,
            audience: std::env::var("API_AUDIENCE").unwrap_or(defaults.audience),
            jwks_url,
            public_key_n: non_empty_var("JWT_PUBLIC_KEY_N"),
            public_key_e: non_empty_var("JWT_PUBLIC_KEY_E"),
            secret: non_empty_var("JWT_SECRET"),
            kid: std::env::var("JWT_KID").unwrap_or(defaults.kid),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Verified token payload
///
/// Only `permissions` matters to the guard; everything else is carried along.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl ClaimSet {
    pub fn subject(&self) -> &str {
        self.sub.as_deref().unwrap_or("anonymous")
    }
}

/// Authentication / authorization failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Authorization header is expected.")]
    MissingHeader,

    #[error("{0}")]
    MalformedHeader(&'static str),

    #[error("{0}")]
    InvalidHeader(&'static str),

    #[error("Token expired.")]
    TokenExpired,

    #[error("{0}")]
    InvalidClaims(&'static str),

    #[error("Permission not found.")]
    Unauthorized,
}

impl AuthError {
    /// Machine-readable reason
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing_header",
            AuthError::MalformedHeader(_) => "malformed_header",
            AuthError::InvalidHeader(_) => "invalid_header",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims(_) => "invalid_claims",
            AuthError::Unauthorized => "unauthorized",
        }
    }

    /// Header-shape failures, raised before any cryptography runs
    pub fn is_header_shape(&self) -> bool {
        match self {
            AuthError::MissingHeader | AuthError::MalformedHeader(_) => true,
            AuthError::InvalidHeader(msg) => *msg == MSG_NOT_BEARER_TOKEN,
            _ => false,
        }
    }
}

/// Extract the token from an `Authorization` header value
///
/// Accepts exactly `Bearer <token>` (scheme is case-insensitive).
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let parts: Vec<&str> = header.split_whitespace().collect();

    match parts.as_slice() {
        [] => Err(AuthError::MalformedHeader(MSG_BEARER_PREFIX)),
        [scheme, ..] if !scheme.eq_ignore_ascii_case("bearer") => {
            Err(AuthError::MalformedHeader(MSG_BEARER_PREFIX))
        }
        [_] => Err(AuthError::MalformedHeader(MSG_TOKEN_NOT_FOUND)),
        [_, token] => Ok(*token),
        _ => Err(AuthError::InvalidHeader(MSG_NOT_BEARER_TOKEN)),
    }
}

/// Token verifier
///
/// Holds the trusted key set and the expected issuer/audience. Shared
/// read-only across requests.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<dyn KeySource>,
    issuer: String,
    audience: String,
}

impl TokenVerifier {
    pub fn new(keys: Arc<dyn KeySource>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
        }
    }

    /// Verify the raw `Authorization` header value
    pub async fn verify(&self, authorization: Option<&str>) -> Result<ClaimSet, AuthError> {
        let token = extract_bearer(authorization)?;
        self.verify_token(token).await
    }

    /// Verify a bare token
    pub async fn verify_token(&self, token: &str) -> Result<ClaimSet, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidHeader(MSG_MALFORMED))?;
        let kid = header.kid.ok_or(AuthError::InvalidHeader(MSG_MALFORMED))?;

        let trusted = match self.keys.resolve(&kid).await {
            Ok(Some(key)) => key,
            Ok(None) => return Err(AuthError::InvalidHeader(MSG_NO_KEY)),
            Err(e) => {
                tracing::error!(error = %e, kid = %kid, "Trusted key lookup failed");
                return Err(AuthError::InvalidHeader(MSG_NO_KEY));
            }
        };

        // The key decides the algorithm, not the token header
        let mut validation = Validation::new(trusted.algorithm);
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        let data = decode::<ClaimSet>(token, &trusted.key, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidAudience
                | ErrorKind::InvalidIssuer
                | ErrorKind::MissingRequiredClaim(_) => AuthError::InvalidClaims(MSG_BAD_CLAIMS),
                _ => {
                    tracing::debug!(error = %e, "Token rejected");
                    AuthError::InvalidHeader(MSG_UNPARSEABLE)
                }
            }
        })?;

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}
