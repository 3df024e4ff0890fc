//! Application state.

use std::sync::Arc;

use coinshop_store::Ledger;

use crate::auth::TokenKeys;
use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The coin ledger.
    pub ledger: Arc<Ledger>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Bearer token signing and verification keys.
    pub keys: Arc<TokenKeys>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(ledger: Arc<Ledger>, config: ServiceConfig) -> Self {
        if config.uses_dev_secret() {
            tracing::warn!("JWT_SECRET not set - using the development signing key");
        }
        if config.secret_pepper.is_empty() {
            tracing::warn!("SECRET_PEPPER not set - password digests are unpeppered");
        }

        let keys = Arc::new(TokenKeys::new(
            &config.jwt_secret,
            config.token_ttl_seconds,
        ));

        Self {
            ledger,
            config,
            keys,
        }
    }
}
