//! Transactional ledger and inventory engine for coinshop.
//!
//! This crate keeps balances and item ownership consistent under concurrent
//! operations. Invariants live in the storage layer (named constraints); the
//! stores translate constraint violations into typed errors and the
//! [`Ledger`] composes them into atomic business operations.
//!
//! # Architecture
//!
//! - [`Database`] / [`Session`]: the backend seam. A session is one database
//!   transaction; it commits explicitly and rolls back on drop.
//! - [`PgDatabase`]: PostgreSQL via `sqlx`.
//! - [`MemoryDatabase`]: in-process backend with the same constraints, used by
//!   tests and local runs.
//! - [`AccountStore`], [`OwnershipStore`], [`TransferLedger`]: per-table stores
//!   with their constraint → error mapping tables.
//! - [`Ledger`]: purchase, send, account bootstrap and the composite info query.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use coinshop_core::LedgerConfig;
//! use coinshop_store::{Ledger, MemoryDatabase};
//!
//! # async fn example() -> coinshop_core::Result<()> {
//! let config = LedgerConfig::default();
//! let db = Arc::new(MemoryDatabase::new(&config.catalog));
//! let ledger = Ledger::new(db, config);
//!
//! let (alice, _) = ledger.authenticate_or_create("alice", "secret").await?;
//! ledger.purchase(&alice.name, "pen").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod accounts;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod ownership;
pub mod postgres;
pub mod schema;
pub mod transfers;

pub use accounts::{AccountError, AccountStore};
pub use error::{Result, StoreError};
pub use ledger::{cancellable, Ledger};
pub use memory::{CommitGate, FaultPoint, MemoryDatabase};
pub use ownership::{OwnershipError, OwnershipStore};
pub use postgres::PgDatabase;
pub use transfers::{TransferError, TransferLedger};

use async_trait::async_trait;
use coinshop_core::{Account, Ownership, TransferRecord, UserInfo};

/// A storage backend that hands out transactional sessions.
#[async_trait]
pub trait Database: Send + Sync {
    /// Open a new unit of work.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection or transaction can be obtained.
    async fn begin(&self) -> Result<Box<dyn Session>>;

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend does not answer.
    async fn ping(&self) -> Result<()>;
}

/// One database transaction.
///
/// Statements run inside the transaction and become visible to other sessions
/// only after [`Session::commit`]. Dropping a session without committing
/// discards every change it made.
///
/// Methods report constraint violations as [`StoreError::Constraint`] and do
/// not interpret them; the stores do.
#[async_trait]
pub trait Session: Send {
    /// Fetch an account by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn fetch_account(&mut self, name: &str) -> Result<Option<Account>>;

    /// Insert a new account.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation for a duplicate name or negative balance.
    async fn insert_account(&mut self, name: &str, secret: &str, balance: i64) -> Result<Account>;

    /// Subtract `amount` from a balance in one conditional statement.
    ///
    /// Returns `None` if the account does not exist.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation if the balance would go negative.
    async fn debit_balance(&mut self, name: &str, amount: i64) -> Result<Option<Account>>;

    /// Add `amount` to a balance.
    ///
    /// Returns `None` if the account does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn credit_balance(&mut self, name: &str, amount: i64) -> Result<Option<Account>>;

    /// Insert an ownership row with quantity 1 or increment the existing one.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation for an unknown account or item.
    async fn upsert_ownership(&mut self, account: &str, item: &str) -> Result<Ownership>;

    /// Append a transfer record.
    ///
    /// # Errors
    ///
    /// Returns a constraint violation for a non-positive amount or unknown
    /// sender or recipient.
    async fn insert_transfer(
        &mut self,
        sender: &str,
        recipient: &str,
        amount: i64,
    ) -> Result<TransferRecord>;

    /// Load balance, inventory and transfer history in one read.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn load_user_info(&mut self, name: &str) -> Result<Option<UserInfo>>;

    /// Make every change of this session durable and visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; nothing is applied in that case.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discard every change of this session.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to roll back cleanly.
    async fn rollback(self: Box<Self>) -> Result<()>;
}
