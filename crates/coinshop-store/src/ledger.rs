//! Transaction orchestrator.
//!
//! Every operation runs in one [`Session`]: all steps commit together or
//! none do. Store errors are translated into [`LedgerError`] here and
//! nowhere else.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use coinshop_core::{
    Account, Catalog, LedgerConfig, LedgerError, Ownership, Result, TransferRecord, UserInfo,
};

use crate::accounts::{AccountError, AccountStore};
use crate::error::StoreError;
use crate::ownership::{OwnershipError, OwnershipStore};
use crate::transfers::{TransferError, TransferLedger};
use crate::{Database, Session};

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AccountError> for LedgerError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::AlreadyExists { name } => Self::AlreadyExists { account: name },
            AccountError::InsufficientFunds { name, amount } => Self::NotEnoughCoins {
                account: name,
                required: amount,
            },
            AccountError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<OwnershipError> for LedgerError {
    fn from(err: OwnershipError) -> Self {
        match err {
            OwnershipError::InvalidAccount { account } => Self::AccountGone { account },
            OwnershipError::InvalidItem { item } => {
                // The catalog listed the item but the item table does not.
                tracing::error!(%item, "Catalog item missing from storage");
                Self::Internal(format!("catalog item {item} missing from storage"))
            }
            OwnershipError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<TransferError> for LedgerError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::NonPositiveAmount { amount } => Self::InvalidAmount { amount },
            TransferError::InvalidSender { sender } => Self::AccountGone { account: sender },
            TransferError::InvalidRecipient { recipient } => Self::UnknownRecipient { recipient },
            TransferError::Internal(msg) => Self::Internal(msg),
        }
    }
}

/// The coin ledger.
///
/// Cheap to share behind an `Arc`; every call borrows one session from the
/// backend and releases it on every exit path.
pub struct Ledger {
    db: Arc<dyn Database>,
    config: LedgerConfig,
}

impl Ledger {
    /// Create a ledger over `db` with an immutable configuration.
    #[must_use]
    pub fn new(db: Arc<dyn Database>, config: LedgerConfig) -> Self {
        Self { db, config }
    }

    /// The configuration the ledger was built with.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The merch catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.config.catalog
    }

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the backend is unreachable.
    pub async fn ping(&self) -> Result<()> {
        self.db.ping().await.map_err(LedgerError::from)
    }

    /// Look up an account. A miss is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the backend fails.
    pub async fn find_account(&self, name: &str) -> Result<Option<Account>> {
        let mut session = self.begin().await?;
        let result = AccountStore::new(session.as_mut())
            .find_by_name(name)
            .await
            .map_err(LedgerError::from);
        release(session, result).await
    }

    /// Return the account called `name`, creating it with the welcome bonus
    /// if it does not exist yet.
    ///
    /// The flag is `true` when this call created the account. Comparing
    /// `secret` against an existing account's secret is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the backend fails.
    pub async fn authenticate_or_create(
        &self,
        name: &str,
        secret: &str,
    ) -> Result<(Account, bool)> {
        let mut session = self.begin().await?;
        let result = bootstrap(session.as_mut(), name, secret, self.config.welcome_bonus).await;

        match result {
            Ok((account, true)) => {
                commit(session).await?;
                tracing::info!(
                    account = %account.name,
                    balance = account.balance,
                    "Account created"
                );
                Ok((account, true))
            }
            Ok((account, false)) => {
                release(session, Ok(())).await?;
                Ok((account, false))
            }
            Err(LedgerError::AlreadyExists { account }) => {
                // Lost a creation race; the winner's row is committed now.
                release(session, Ok(())).await?;
                tracing::debug!(%account, "Concurrent account creation, re-reading");
                self.find_account(name)
                    .await?
                    .map(|account| (account, false))
                    .ok_or_else(|| {
                        LedgerError::Internal(format!("account {name} vanished after creation"))
                    })
            }
            Err(err) => Err(abort(session, err).await),
        }
    }

    /// Buy one unit of `item` for `account` at the catalog price.
    ///
    /// # Errors
    ///
    /// - `UnknownItem` if the catalog does not list `item`.
    /// - `NotEnoughCoins` if the balance cannot cover the price.
    /// - `AccountGone` if the account does not exist.
    /// - `Internal` on storage failure; nothing is applied.
    pub async fn purchase(&self, account: &str, item: &str) -> Result<Ownership> {
        let price = self
            .catalog()
            .price(item)
            .ok_or_else(|| LedgerError::UnknownItem {
                item: item.to_string(),
            })?;

        let mut session = self.begin().await?;
        let result = buy(session.as_mut(), account, item, price).await;
        let ownership = finish(session, result).await?;

        tracing::debug!(
            %account,
            %item,
            price,
            quantity = ownership.quantity,
            "Purchase committed"
        );
        Ok(ownership)
    }

    /// Move `amount` coins from `sender` to `recipient`.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount <= 0`.
    /// - `UnknownRecipient` if the recipient does not exist.
    /// - `AccountGone` if the sender does not exist.
    /// - `NotEnoughCoins` if the sender cannot cover `amount`.
    /// - `Internal` on storage failure; nothing is applied.
    pub async fn send(&self, sender: &str, recipient: &str, amount: i64) -> Result<TransferRecord> {
        let mut session = self.begin().await?;
        let result = transfer(session.as_mut(), sender, recipient, amount).await;
        let record = finish(session, result).await?;

        tracing::debug!(
            %sender,
            %recipient,
            amount,
            transfer_id = record.id,
            "Transfer committed"
        );
        Ok(record)
    }

    /// Balance, inventory and transfer history of `name`, or `None` if the
    /// account does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the backend fails.
    pub async fn info(&self, name: &str) -> Result<Option<UserInfo>> {
        let mut session = self.begin().await?;
        let result = session
            .load_user_info(name)
            .await
            .map_err(LedgerError::from);
        release(session, result).await
    }

    async fn begin(&self) -> Result<Box<dyn Session>> {
        self.db.begin().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to open session");
            LedgerError::from(e)
        })
    }
}

async fn bootstrap(
    session: &mut dyn Session,
    name: &str,
    secret: &str,
    welcome_bonus: i64,
) -> Result<(Account, bool)> {
    let mut accounts = AccountStore::new(session);
    if let Some(account) = accounts.find_by_name(name).await? {
        return Ok((account, false));
    }
    let account = accounts.create(name, secret, welcome_bonus).await?;
    Ok((account, true))
}

async fn buy(
    session: &mut dyn Session,
    account: &str,
    item: &str,
    price: i64,
) -> Result<Ownership> {
    AccountStore::new(&mut *session).debit(account, price).await?;
    let ownership = OwnershipStore::new(session).grant_item(account, item).await?;
    Ok(ownership)
}

async fn transfer(
    session: &mut dyn Session,
    sender: &str,
    recipient: &str,
    amount: i64,
) -> Result<TransferRecord> {
    let record = TransferLedger::new(&mut *session)
        .record(sender, recipient, amount)
        .await?;

    let mut accounts = AccountStore::new(session);
    accounts.debit(sender, amount).await?;
    accounts.credit(recipient, amount).await?;
    Ok(record)
}

/// Commit on success, roll back on failure.
async fn finish<T>(session: Box<dyn Session>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            commit(session).await?;
            Ok(value)
        }
        Err(err) => Err(abort(session, err).await),
    }
}

/// Close a read-only session.
async fn release<T>(session: Box<dyn Session>, result: Result<T>) -> Result<T> {
    if let Err(e) = session.rollback().await {
        tracing::warn!(error = %e, "Failed to release read session");
    }
    result.map_err(log_internal)
}

async fn commit(session: Box<dyn Session>) -> Result<()> {
    session.commit().await.map_err(|e| {
        tracing::error!(error = %e, "Commit failed");
        LedgerError::from(e)
    })
}

async fn abort(session: Box<dyn Session>, err: LedgerError) -> LedgerError {
    if let Err(e) = session.rollback().await {
        tracing::error!(error = %e, "Rollback failed");
    }
    log_internal(err)
}

fn log_internal(err: LedgerError) -> LedgerError {
    if let LedgerError::Internal(ref msg) = err {
        tracing::error!(error = %msg, "Ledger operation failed");
    }
    err
}

/// Run a ledger operation until it finishes or `token` is cancelled.
///
/// On cancellation the operation future is dropped, which drops its session
/// and rolls back everything it did.
///
/// # Errors
///
/// Returns `Cancelled` if the token fires first, otherwise the operation's
/// own result.
pub async fn cancellable<T, F>(token: &CancellationToken, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => {
            tracing::debug!("Ledger operation cancelled");
            Err(LedgerError::Cancelled)
        }
        result = operation => result,
    }
}
