//! Shared request state

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{KeySource, RemoteJwks, StaticKeySet, TokenVerifier};
use crate::core::{Config, Result, ServerError};
use crate::db::{DrinkStore, MemoryDrinkStore, PgDrinkStore, starter_drinks};

/// Server state, cloned into every handler
///
/// | Field | Role |
/// |-------|------|
/// | store | drink persistence |
/// | verifier | bearer token verification |
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn DrinkStore>,
    pub verifier: Arc<TokenVerifier>,
}

impl ServerState {
    pub fn new(store: Arc<dyn DrinkStore>, verifier: Arc<TokenVerifier>) -> Self {
        Self { store, verifier }
    }

    /// Build the store and the verifier from configuration
    pub async fn initialize(config: &Config) -> Result<Self> {
        let store = build_store(config).await?;
        let jwt = &config.jwt;
        let keys = build_key_source(config)?;
        let verifier = TokenVerifier::new(keys, jwt.issuer.clone(), jwt.audience.clone());
        Ok(Self::new(store, Arc::new(verifier)))
    }
}

async fn build_store(config: &Config) -> Result<Arc<dyn DrinkStore>> {
    match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;

            let store = PgDrinkStore::new(pool);
            if config.reset_database {
                store.reset(&starter_drinks()?).await?;
                tracing::warn!("Drink menu reset to starter drinks");
            }
            tracing::info!("Using PostgreSQL drink store");
            Ok(Arc::new(store))
        }
        None if config.is_development() => {
            let store = MemoryDrinkStore::new();
            if config.reset_database {
                store.reset(&starter_drinks()?)?;
            }
            tracing::warn!("DATABASE_URL not set, using in-memory drink store");
            Ok(Arc::new(store))
        }
        None => Err(ServerError::Config("DATABASE_URL is required".to_string())),
    }
}

/// Remote key set first, then a pinned RSA key, then the development secret
fn build_key_source(config: &Config) -> Result<Arc<dyn KeySource>> {
    let jwt = &config.jwt;
    if let Some(url) = &jwt.jwks_url {
        tracing::info!(jwks_url = %url, issuer = %jwt.issuer, "Verifying tokens against remote key set");
        return Ok(Arc::new(RemoteJwks::new(url.clone())?));
    }
    if let (Some(n), Some(e)) = (&jwt.public_key_n, &jwt.public_key_e) {
        tracing::info!(kid = %jwt.kid, issuer = %jwt.issuer, "Verifying tokens with pinned RSA key");
        return Ok(Arc::new(
            StaticKeySet::new().with_rsa_components(jwt.kid.clone(), n, e)?,
        ));
    }
    match &jwt.secret {
        Some(secret) if config.is_development() => {
            tracing::warn!(kid = %jwt.kid, "Verifying tokens with development HMAC secret");
            Ok(Arc::new(
                StaticKeySet::new().with_secret(jwt.kid.clone(), secret.as_bytes()),
            ))
        }
        _ => Err(ServerError::Config(
            "no token signing keys configured (set AUTH0_DOMAIN, JWKS_URL, JWT_PUBLIC_KEY_N/E or JWT_SECRET)"
                .to_string(),
        )),
    }
}
