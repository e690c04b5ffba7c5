//! Trusted signing keys
//!
//! - [`RemoteJwks`] - identity provider JWKS, cached and refetched on rotation
//! - [`StaticKeySet`] - keys known up front (tests, local development)

use std::collections::HashMap;
use std::str::FromStr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::RwLock;

/// A verification key and the only algorithm it may be used with
#[derive(Clone)]
pub struct TrustedKey {
    pub key: DecodingKey,
    pub algorithm: Algorithm,
}

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("failed to fetch key set: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("invalid key {kid}: {reason}")]
    InvalidKey { kid: String, reason: String },
}

/// Source of trusted keys, looked up by `kid`
#[async_trait]
pub trait KeySource: Send + Sync {
    async fn resolve(&self, kid: &str) -> Result<Option<TrustedKey>, KeySetError>;
}

/// Fixed in-memory key set
#[derive(Clone, Default)]
pub struct StaticKeySet {
    keys: HashMap<String, TrustedKey>,
}

impl StaticKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an HS256 shared secret
    pub fn with_secret(mut self, kid: impl Into<String>, secret: &[u8]) -> Self {
        self.keys.insert(
            kid.into(),
            TrustedKey {
                key: DecodingKey::from_secret(secret),
                algorithm: Algorithm::HS256,
            },
        );
        self
    }

    /// Register an RS256 public key from its base64url modulus and exponent
    pub fn with_rsa_components(
        mut self,
        kid: impl Into<String>,
        n: &str,
        e: &str,
    ) -> Result<Self, KeySetError> {
        let kid = kid.into();
        let key = DecodingKey::from_rsa_components(n, e).map_err(|err| KeySetError::InvalidKey {
            kid: kid.clone(),
            reason: err.to_string(),
        })?;
        self.keys.insert(
            kid,
            TrustedKey {
                key,
                algorithm: Algorithm::RS256,
            },
        );
        Ok(self)
    }
}

#[async_trait]
impl KeySource for StaticKeySet {
    async fn resolve(&self, kid: &str) -> Result<Option<TrustedKey>, KeySetError> {
        Ok(self.keys.get(kid).cloned())
    }
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    kty: String,
    alg: Option<String>,
    #[serde(rename = "use")]
    key_use: Option<String>,
    n: Option<String>,
    e: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JwksDocument {
    keys: Vec<Jwk>,
}

/// Shortest gap between two fetches of the remote key set
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Default)]
struct JwksCache {
    keys: HashMap<String, TrustedKey>,
    fetched_at: Option<Instant>,
}

/// Identity provider key set fetched over HTTPS
///
/// Keys are cached until a token presents an unknown `kid`, which triggers a
/// refetch. Refetches are serialized behind the cache's write lock and are at
/// most one per `min_refresh_interval`; a failed fetch counts too. Rotated-out
/// keys disappear on the next refetch.
pub struct RemoteJwks {
    url: String,
    client: reqwest::Client,
    min_refresh_interval: Duration,
    cache: RwLock<JwksCache>,
}

impl RemoteJwks {
    pub fn new(url: impl Into<String>) -> Result<Self, KeySetError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
            min_refresh_interval: MIN_REFRESH_INTERVAL,
            cache: RwLock::new(JwksCache::default()),
        })
    }

    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Refetch into `cache`; the caller holds the write lock
    async fn refresh(&self, cache: &mut JwksCache) -> Result<usize, KeySetError> {
        tracing::info!(event = "jwks_refresh", url = %self.url);
        cache.fetched_at = Some(Instant::now());

        let document: JwksDocument = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        cache.keys = keys_from_document(document);
        Ok(cache.keys.len())
    }
}

#[async_trait]
impl KeySource for RemoteJwks {
    async fn resolve(&self, kid: &str) -> Result<Option<TrustedKey>, KeySetError> {
        if let Some(key) = self.cache.read().await.keys.get(kid) {
            return Ok(Some(key.clone()));
        }

        let mut cache = self.cache.write().await;
        // A request queued on the lock may find the key already fetched
        if let Some(key) = cache.keys.get(kid) {
            return Ok(Some(key.clone()));
        }
        if cache
            .fetched_at
            .is_some_and(|at| at.elapsed() < self.min_refresh_interval)
        {
            tracing::debug!(kid = %kid, "Unknown kid, key set fetched recently");
            return Ok(None);
        }

        self.refresh(&mut cache).await?;
        Ok(cache.keys.get(kid).cloned())
    }
}

/// Keep RSA signing keys that carry a `kid`; everything else is skipped
fn keys_from_document(document: JwksDocument) -> HashMap<String, TrustedKey> {
    let mut keys = HashMap::new();
    for jwk in document.keys {
        let (Some(kid), Some(n), Some(e)) = (jwk.kid, jwk.n, jwk.e) else {
            continue;
        };
        if jwk.kty != "RSA" || jwk.key_use.as_deref().is_some_and(|u| u != "sig") {
            continue;
        }

        let algorithm = jwk
            .alg
            .as_deref()
            .map(Algorithm::from_str)
            .transpose()
            .ok()
            .flatten()
            .unwrap_or(Algorithm::RS256);

        match DecodingKey::from_rsa_components(&n, &e) {
            Ok(key) => {
                keys.insert(kid, TrustedKey { key, algorithm });
            }
            Err(err) => tracing::warn!(kid = %kid, error = %err, "Skipping unusable JWKS key"),
        }
    }
    keys
}
