//! Coin transfer records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An append-only record of coins moving between two accounts.
///
/// Records are written in the same unit of work as the matching debit and
/// credit, so a record is never visible without its balance effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Insertion sequence number.
    pub id: i64,
    /// Debited account.
    pub sender: String,
    /// Credited account.
    pub recipient: String,
    /// Coins moved (always > 0).
    pub amount: i64,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}
