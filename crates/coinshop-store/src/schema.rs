//! Database schema definitions.
//!
//! Table and constraint names shared by the SQL migrations, the PostgreSQL
//! backend and the in-memory backend. The stores translate violations of
//! these constraints into their typed errors.

/// Table names.
pub mod table {
    /// Catalog items, keyed by `slug`.
    pub const CATALOG_ITEMS: &str = "catalog_items";

    /// Accounts, keyed by `name`.
    pub const ACCOUNTS: &str = "accounts";

    /// Item ownership, keyed by `account_name || item_slug`.
    pub const OWNERSHIPS: &str = "ownerships";

    /// Append-only transfer ledger, ordered by `id`.
    pub const TRANSFERS: &str = "transfers";
}

/// Constraint names.
pub mod constraint {
    /// Unique account name.
    pub const ACCOUNTS_PKEY: &str = "accounts_pkey";

    /// `balance >= 0`.
    pub const ACCOUNTS_BALANCE_NON_NEGATIVE: &str = "accounts_balance_non_negative";

    /// One row per account/item pair.
    pub const OWNERSHIPS_PKEY: &str = "ownerships_pkey";

    /// Owner must be an existing account.
    pub const OWNERSHIPS_FK_ACCOUNT: &str = "ownerships_fk_account";

    /// Item must be a catalog item.
    pub const OWNERSHIPS_FK_ITEM: &str = "ownerships_fk_item";

    /// `quantity >= 1`.
    pub const OWNERSHIPS_QUANTITY_POSITIVE: &str = "ownerships_quantity_positive";

    /// `amount > 0`.
    pub const TRANSFERS_AMOUNT_POSITIVE: &str = "transfers_amount_positive";

    /// Sender must be an existing account.
    pub const TRANSFERS_FK_SENDER: &str = "transfers_fk_sender";

    /// Recipient must be an existing account.
    pub const TRANSFERS_FK_RECIPIENT: &str = "transfers_fk_recipient";
}
