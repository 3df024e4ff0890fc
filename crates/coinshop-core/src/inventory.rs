//! Item ownership.

use serde::{Deserialize, Serialize};

/// How many units of a catalog item an account owns.
///
/// One row per `(account_name, item_slug)` pair. Rows are created with
/// quantity 1 on the first purchase and incremented on every repeat purchase;
/// quantity is never below 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    /// Owning account.
    pub account_name: String,
    /// Owned item.
    pub item_slug: String,
    /// Units owned (always >= 1).
    pub quantity: i64,
}
