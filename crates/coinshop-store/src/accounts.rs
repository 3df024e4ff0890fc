//! Account store.
//!
//! Owns account records and the non-negative balance invariant. Debits are a
//! single conditional statement checked by the `accounts_balance_non_negative`
//! constraint, so concurrent debits on one account serialize in the database
//! and the later one sees the earlier one's result.

use coinshop_core::Account;

use crate::error::{classify, StoreError};
use crate::schema::constraint;
use crate::Session;

/// What an account constraint violation means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountViolation {
    /// The name is taken.
    DuplicateName,
    /// The balance would be negative.
    NegativeBalance,
}

/// Constraint → violation mapping for the `accounts` table.
pub const CONSTRAINTS: &[(&str, AccountViolation)] = &[
    (constraint::ACCOUNTS_PKEY, AccountViolation::DuplicateName),
    (
        constraint::ACCOUNTS_BALANCE_NON_NEGATIVE,
        AccountViolation::NegativeBalance,
    ),
];

/// Errors returned by the account store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    /// An account with this name already exists.
    #[error("account already exists: {name}")]
    AlreadyExists {
        /// The duplicate name.
        name: String,
    },

    /// The debit would drive the balance negative.
    #[error("insufficient funds: {name} cannot pay {amount}")]
    InsufficientFunds {
        /// The debited account.
        name: String,
        /// The rejected debit.
        amount: i64,
    },

    /// Storage failure or caller defect.
    #[error("account store: {0}")]
    Internal(String),
}

/// Account operations bound to one session.
pub struct AccountStore<'s> {
    session: &'s mut dyn Session,
}

impl<'s> AccountStore<'s> {
    /// Bind the store to a session.
    pub fn new(session: &'s mut dyn Session) -> Self {
        Self { session }
    }

    /// Look up an account. A miss is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the database operation fails.
    pub async fn find_by_name(&mut self, name: &str) -> Result<Option<Account>, AccountError> {
        self.session
            .fetch_account(name)
            .await
            .map_err(|e| AccountError::Internal(e.to_string()))
    }

    /// Create an account with a starting balance.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the name is taken.
    /// - `Internal` if `initial_balance` is negative or the database fails.
    pub async fn create(
        &mut self,
        name: &str,
        secret: &str,
        initial_balance: i64,
    ) -> Result<Account, AccountError> {
        self.session
            .insert_account(name, secret, initial_balance)
            .await
            .map_err(|err| match classify(CONSTRAINTS, &err) {
                Some(AccountViolation::DuplicateName) => AccountError::AlreadyExists {
                    name: name.to_string(),
                },
                Some(AccountViolation::NegativeBalance) => AccountError::Internal(format!(
                    "initial balance {initial_balance} for {name} must be non-negative"
                )),
                None => AccountError::Internal(err.to_string()),
            })
    }

    /// Subtract `amount` from the balance.
    ///
    /// # Errors
    ///
    /// - `InsufficientFunds` if the balance would go negative.
    /// - `Internal` if the account does not exist, `amount` is negative, or
    ///   the database fails.
    pub async fn debit(&mut self, name: &str, amount: i64) -> Result<Account, AccountError> {
        if amount < 0 {
            return Err(AccountError::Internal(format!(
                "debit of negative amount {amount} from {name}"
            )));
        }

        let updated = self
            .session
            .debit_balance(name, amount)
            .await
            .map_err(|err| match classify(CONSTRAINTS, &err) {
                Some(AccountViolation::NegativeBalance) => AccountError::InsufficientFunds {
                    name: name.to_string(),
                    amount,
                },
                _ => AccountError::Internal(err.to_string()),
            })?;

        updated.ok_or_else(|| missing(name))
    }

    /// Add `amount` to the balance. No upper bound is enforced.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the account does not exist, `amount` is negative,
    /// or the database fails.
    pub async fn credit(&mut self, name: &str, amount: i64) -> Result<Account, AccountError> {
        if amount < 0 {
            return Err(AccountError::Internal(format!(
                "credit of negative amount {amount} to {name}"
            )));
        }

        let updated = self
            .session
            .credit_balance(name, amount)
            .await
            .map_err(|err: StoreError| AccountError::Internal(err.to_string()))?;

        updated.ok_or_else(|| missing(name))
    }
}

fn missing(name: &str) -> AccountError {
    AccountError::Internal(format!("account {name} does not exist"))
}
