use crate::auth::JwtConfig;
use crate::core::{Result, ServerError};

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | HTTP_PORT | 5000 | HTTP listen port |
/// | ENVIRONMENT | development | development / production |
/// | DATABASE_URL | - | PostgreSQL URL (in-memory store when unset in development) |
/// | RESET_DATABASE | false | wipe the menu and seed the starter drink at startup |
/// | LOG_FORMAT | text | text / json |
///
/// Token settings are read by [`JwtConfig::from_env`].
///
/// # Example
///
/// ```ignore
/// DATABASE_URL=postgres://localhost/drinks AUTH0_DOMAIN=coffee.eu.auth0.com cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API port
    pub http_port: u16,
    /// Environment: development | production
    pub environment: String,
    /// PostgreSQL connection string
    pub database_url: Option<String>,
    /// Drop all drinks and seed the starter menu on startup
    pub reset_database: bool,
    /// Emit JSON log lines
    pub log_json: bool,
    /// Token verification settings
    pub jwt: JwtConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 5000,
            environment: "development".to_string(),
            database_url: None,
            reset_database: false,
            log_json: false,
            jwt: JwtConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let environment = std::env::var("ENVIRONMENT").unwrap_or(defaults.environment);

        let config = Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.http_port),
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            reset_database: std::env::var("RESET_DATABASE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.reset_database),
            log_json: std::env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),
            jwt: JwtConfig::from_env(),
            environment,
        };
        config.validate()?;
        Ok(config)
    }

    /// Production needs a real database and a real identity provider
    pub fn validate(&self) -> Result<()> {
        if !self.is_production() {
            return Ok(());
        }
        if self.database_url.is_none() {
            return Err(ServerError::Config(
                "DATABASE_URL must be set in production".to_string(),
            ));
        }
        let pinned_key = self.jwt.public_key_n.is_some() && self.jwt.public_key_e.is_some();
        if self.jwt.jwks_url.is_none() && !pinned_key {
            return Err(ServerError::Config(
                "AUTH0_DOMAIN, JWKS_URL or JWT_PUBLIC_KEY_N/E must be set in production"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
