//! Composite account view.
//!
//! `UserInfo` joins an account's balance, its full inventory and its transfer
//! history into the shape clients consume. Inventory and history lists are
//! always present, empty when there is nothing to show.

use serde::{Deserialize, Serialize};

/// Balance, inventory and transfer history of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Account name (not part of the wire shape).
    #[serde(skip)]
    pub name: String,
    /// Current balance.
    pub coins: i64,
    /// Owned items, ordered by slug.
    pub inventory: Vec<InventoryItem>,
    /// Transfers split into received and sent.
    pub coin_history: CoinHistory,
}

impl UserInfo {
    /// An account view with no purchases and no transfers.
    #[must_use]
    pub fn empty(name: impl Into<String>, coins: i64) -> Self {
        Self {
            name: name.into(),
            coins,
            inventory: Vec::new(),
            coin_history: CoinHistory::default(),
        }
    }

    /// Quantity of `slug` in the inventory (0 if not owned).
    #[must_use]
    pub fn quantity_of(&self, slug: &str) -> i64 {
        self.inventory
            .iter()
            .find(|item| item.item == slug)
            .map_or(0, |item| item.quantity)
    }
}

/// One inventory line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Item slug.
    #[serde(rename = "type")]
    pub item: String,
    /// Units owned.
    pub quantity: i64,
}

/// Transfer history of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinHistory {
    /// Incoming transfers, oldest first.
    #[serde(default)]
    pub received: Vec<ReceivedCoins>,
    /// Outgoing transfers, oldest first.
    #[serde(default)]
    pub sent: Vec<SentCoins>,
}

/// An incoming transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedCoins {
    /// Sender account.
    pub from_user: String,
    /// Coins received.
    pub amount: i64,
}

/// An outgoing transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentCoins {
    /// Recipient account.
    pub to_user: String,
    /// Coins sent.
    pub amount: i64,
}
