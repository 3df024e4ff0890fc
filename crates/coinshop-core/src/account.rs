//! Account types for coinshop.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A coin account.
///
/// Accounts are created once, on first authentication, with the configured
/// welcome bonus. The balance is only ever changed by the ledger's debit and
/// credit operations and never drops below zero. Accounts are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account name.
    pub name: String,

    /// Opaque secret owned by the authentication layer.
    #[serde(default, skip_serializing)]
    pub secret: String,

    /// Current coin balance (always >= 0).
    pub balance: i64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create an account value with the given starting balance.
    #[must_use]
    pub fn new(name: impl Into<String>, secret: impl Into<String>, balance: i64) -> Self {
        Self {
            name: name.into(),
            secret: secret.into(),
            balance,
            created_at: Utc::now(),
        }
    }
}
