//! Ledger configuration.

use crate::Catalog;

/// Coins granted to every newly created account.
pub const DEFAULT_WELCOME_BONUS: i64 = 1000;

/// Start-up constants injected into the ledger.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Purchasable items and their prices.
    pub catalog: Catalog,

    /// Starting balance of a new account.
    pub welcome_bonus: i64,
}

impl LedgerConfig {
    /// Create a configuration from a catalog and welcome bonus.
    #[must_use]
    pub fn new(catalog: Catalog, welcome_bonus: i64) -> Self {
        Self {
            catalog,
            welcome_bonus,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            catalog: Catalog::merch(),
            welcome_bonus: DEFAULT_WELCOME_BONUS,
        }
    }
}
