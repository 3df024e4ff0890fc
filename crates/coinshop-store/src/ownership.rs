//! Ownership store.
//!
//! Per-account item quantities. Granting an item is an upsert keyed by
//! `(account_name, item_slug)`: the first grant inserts quantity 1, every
//! later grant increments it in place.

use coinshop_core::Ownership;

use crate::error::classify;
use crate::schema::constraint;
use crate::Session;

/// What an ownership constraint violation means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipViolation {
    /// The owner is not an account.
    UnknownAccount,
    /// The item is not a catalog item.
    UnknownItem,
    /// The quantity left the `>= 1` range.
    QuantityOutOfRange,
}

/// Constraint → violation mapping for the `ownerships` table.
///
/// The primary key is absent on purpose: conflicts on it are resolved by the
/// upsert and never surface.
pub const CONSTRAINTS: &[(&str, OwnershipViolation)] = &[
    (
        constraint::OWNERSHIPS_FK_ACCOUNT,
        OwnershipViolation::UnknownAccount,
    ),
    (constraint::OWNERSHIPS_FK_ITEM, OwnershipViolation::UnknownItem),
    (
        constraint::OWNERSHIPS_QUANTITY_POSITIVE,
        OwnershipViolation::QuantityOutOfRange,
    ),
];

/// Errors returned by the ownership store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OwnershipError {
    /// The account does not exist.
    #[error("invalid account: {account}")]
    InvalidAccount {
        /// The missing account.
        account: String,
    },

    /// The item is not known to the storage catalog.
    #[error("invalid item: {item}")]
    InvalidItem {
        /// The unknown slug.
        item: String,
    },

    /// Storage failure.
    #[error("ownership store: {0}")]
    Internal(String),
}

/// Ownership operations bound to one session.
pub struct OwnershipStore<'s> {
    session: &'s mut dyn Session,
}

impl<'s> OwnershipStore<'s> {
    /// Bind the store to a session.
    pub fn new(session: &'s mut dyn Session) -> Self {
        Self { session }
    }

    /// Give `account` one more unit of `item`.
    ///
    /// # Errors
    ///
    /// - `InvalidAccount` if the account does not exist.
    /// - `InvalidItem` if the item is not in the storage catalog.
    /// - `Internal` if the database fails.
    pub async fn grant_item(
        &mut self,
        account: &str,
        item: &str,
    ) -> Result<Ownership, OwnershipError> {
        self.session
            .upsert_ownership(account, item)
            .await
            .map_err(|err| match classify(CONSTRAINTS, &err) {
                Some(OwnershipViolation::UnknownAccount) => OwnershipError::InvalidAccount {
                    account: account.to_string(),
                },
                Some(OwnershipViolation::UnknownItem) => OwnershipError::InvalidItem {
                    item: item.to_string(),
                },
                Some(OwnershipViolation::QuantityOutOfRange) | None => {
                    OwnershipError::Internal(err.to_string())
                }
            })
    }
}
