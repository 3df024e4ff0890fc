//! Transfer ledger.
//!
//! Append-only audit trail of coin movements. A record is written in the same
//! session as the debit and credit it describes, before them, so a bad
//! recipient is rejected before any balance is touched.

use coinshop_core::TransferRecord;

use crate::error::classify;
use crate::schema::constraint;
use crate::Session;

/// What a transfer constraint violation means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferViolation {
    /// `amount <= 0`.
    NonPositiveAmount,
    /// The sender is not an account.
    UnknownSender,
    /// The recipient is not an account.
    UnknownRecipient,
}

/// Constraint → violation mapping for the `transfers` table.
pub const CONSTRAINTS: &[(&str, TransferViolation)] = &[
    (
        constraint::TRANSFERS_AMOUNT_POSITIVE,
        TransferViolation::NonPositiveAmount,
    ),
    (
        constraint::TRANSFERS_FK_SENDER,
        TransferViolation::UnknownSender,
    ),
    (
        constraint::TRANSFERS_FK_RECIPIENT,
        TransferViolation::UnknownRecipient,
    ),
];

/// Errors returned by the transfer ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The amount is zero or negative.
    #[error("transfer amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// The rejected amount.
        amount: i64,
    },

    /// The sender does not exist.
    #[error("invalid sender: {sender}")]
    InvalidSender {
        /// The missing sender.
        sender: String,
    },

    /// The recipient does not exist.
    #[error("invalid recipient: {recipient}")]
    InvalidRecipient {
        /// The missing recipient.
        recipient: String,
    },

    /// Storage failure.
    #[error("transfer ledger: {0}")]
    Internal(String),
}

/// Transfer operations bound to one session.
pub struct TransferLedger<'s> {
    session: &'s mut dyn Session,
}

impl<'s> TransferLedger<'s> {
    /// Bind the ledger to a session.
    pub fn new(session: &'s mut dyn Session) -> Self {
        Self { session }
    }

    /// Append a transfer of `amount` coins from `sender` to `recipient`.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` if `amount <= 0`.
    /// - `InvalidSender` / `InvalidRecipient` for unknown accounts.
    /// - `Internal` if the database fails.
    pub async fn record(
        &mut self,
        sender: &str,
        recipient: &str,
        amount: i64,
    ) -> Result<TransferRecord, TransferError> {
        self.session
            .insert_transfer(sender, recipient, amount)
            .await
            .map_err(|err| match classify(CONSTRAINTS, &err) {
                Some(TransferViolation::NonPositiveAmount) => {
                    TransferError::NonPositiveAmount { amount }
                }
                Some(TransferViolation::UnknownSender) => TransferError::InvalidSender {
                    sender: sender.to_string(),
                },
                Some(TransferViolation::UnknownRecipient) => TransferError::InvalidRecipient {
                    recipient: recipient.to_string(),
                },
                None => TransferError::Internal(err.to_string()),
            })
    }
}
