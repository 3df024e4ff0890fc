//! Error types for coinshop.

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors surfaced by the ledger at its public boundary.
///
/// Absence of an account is not an error: lookups return `Option`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The item is not in the catalog.
    #[error("unknown item: {item}")]
    UnknownItem {
        /// The requested slug.
        item: String,
    },

    /// The account cannot cover the debit.
    #[error("not enough coins: {account} needs {required}")]
    NotEnoughCoins {
        /// The debited account.
        account: String,
        /// Coins the operation needed.
        required: i64,
    },

    /// The acting account no longer exists.
    #[error("account does not exist: {account}")]
    AccountGone {
        /// The missing account.
        account: String,
    },

    /// A transfer amount was zero or negative.
    #[error("transfer amount must be positive, got {amount}")]
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
    },

    /// The transfer recipient does not exist.
    #[error("unknown recipient: {recipient}")]
    UnknownRecipient {
        /// The missing recipient.
        recipient: String,
    },

    /// An account with this name already exists.
    #[error("account already exists: {account}")]
    AlreadyExists {
        /// The duplicate name.
        account: String,
    },

    /// The caller cancelled the operation; nothing was applied.
    #[error("operation cancelled")]
    Cancelled,

    /// Unexpected storage failure or defect.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Coarse classification of ledger errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Duplicate account creation.
    AlreadyExists,
    /// A debit would drive a balance negative.
    InsufficientFunds,
    /// An account, item, sender or recipient reference is invalid.
    InvalidReference,
    /// Non-positive transfer amount.
    InvalidAmount,
    /// Storage failure, cancellation or defect.
    Internal,
}

impl LedgerError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotEnoughCoins { .. } => ErrorKind::InsufficientFunds,
            Self::UnknownItem { .. } | Self::AccountGone { .. } | Self::UnknownRecipient { .. } => {
                ErrorKind::InvalidReference
            }
            Self::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            Self::Cancelled | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller caused this error (as opposed to a failure inside
    /// the ledger).
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Internal)
    }
}
