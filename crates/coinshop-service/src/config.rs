//! Service configuration.

use std::str::FromStr;

use coinshop_core::{Catalog, CatalogError, LedgerConfig, DEFAULT_WELCOME_BONUS};

/// Signing key used when `JWT_SECRET` is unset. Only fit for local runs.
pub const DEV_JWT_SECRET: &str = "coinshop-dev-secret";

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL URL. When unset the service runs on the in-memory backend.
    pub database_url: Option<String>,

    /// Maximum pooled database connections (default: 10).
    pub database_max_connections: u32,

    /// Start-up ping attempts before giving up on the database (default: 5).
    pub database_connect_retries: u32,

    /// HS256 key for issuing and verifying bearer tokens.
    pub jwt_secret: String,

    /// HMAC key mixed into stored password digests.
    pub secret_pepper: String,

    /// Lifetime of issued tokens in seconds (default: 86400).
    pub token_ttl_seconds: u64,

    /// Coins granted to new accounts (default: 1000).
    pub welcome_bonus: i64,

    /// Optional JSON catalog file; the built-in merch set is used otherwise.
    pub catalog_path: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Maximum concurrently served `/api` requests.
    pub max_concurrent_requests: usize,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            database_max_connections: env_or(
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            database_connect_retries: env_or(
                "DATABASE_CONNECT_RETRIES",
                defaults.database_connect_retries,
            ),
            jwt_secret: std::env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            secret_pepper: std::env::var("SECRET_PEPPER").unwrap_or(defaults.secret_pepper),
            token_ttl_seconds: env_or("TOKEN_TTL_SECONDS", defaults.token_ttl_seconds),
            welcome_bonus: env_or("WELCOME_BONUS", defaults.welcome_bonus),
            catalog_path: std::env::var("CATALOG_PATH").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_or("MAX_BODY_BYTES", defaults.max_body_bytes),
            request_timeout_seconds: env_or(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout_seconds,
            ),
            max_concurrent_requests: env_or(
                "MAX_CONCURRENT_REQUESTS",
                defaults.max_concurrent_requests,
            ),
        }
    }

    /// Build the ledger configuration: catalog plus welcome bonus.
    ///
    /// # Errors
    ///
    /// Returns an error if `catalog_path` is set but the file is unreadable or
    /// holds an invalid catalog.
    pub fn ledger_config(&self) -> Result<LedgerConfig, CatalogError> {
        let catalog = match &self.catalog_path {
            Some(path) => Catalog::from_json_file(path)?,
            None => Catalog::merch(),
        };
        Ok(LedgerConfig::new(catalog, self.welcome_bonus))
    }

    /// Whether the token signing key is the built-in development key.
    #[must_use]
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Parse an environment variable, falling back to `default` when it is unset
/// or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: None,
            database_max_connections: 10,
            database_connect_retries: 5,
            jwt_secret: DEV_JWT_SECRET.into(),
            secret_pepper: String::new(),
            token_ttl_seconds: 24 * 60 * 60,
            welcome_bonus: DEFAULT_WELCOME_BONUS,
            catalog_path: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024, // 1MB
            request_timeout_seconds: 30,
            max_concurrent_requests: 100,
        }
    }
}
