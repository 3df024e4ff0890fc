//! In-memory storage backend.
//!
//! Sessions are serializable: a session holds the tables for its whole
//! lifetime, works on a private copy and publishes it on commit. Dropping or
//! rolling back a session discards the copy. Every named constraint of the SQL
//! schema is emulated, in the order PostgreSQL evaluates them (CHECK before
//! unique and foreign keys, foreign keys in declaration order).
//!
//! [`MemoryDatabase::inject_fault`] arms one-shot failures at chosen points so
//! tests can break a unit of work half-way, and [`MemoryDatabase::hold_next_commit`]
//! parks a session right before it publishes.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, Notify, OwnedMutexGuard};

use coinshop_core::{
    Account, Catalog, InventoryItem, Ownership, ReceivedCoins, SentCoins, TransferRecord, UserInfo,
};

use crate::error::{Result, StoreError};
use crate::schema::constraint;
use crate::{Database, Session};

/// Points where a fault can be injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// `Session::debit_balance`.
    Debit,
    /// `Session::credit_balance`.
    Credit,
    /// `Session::upsert_ownership`.
    GrantItem,
    /// `Session::insert_transfer`.
    RecordTransfer,
    /// `Session::commit`.
    Commit,
}

/// A commit parked by [`MemoryDatabase::hold_next_commit`].
#[derive(Debug, Default)]
pub struct CommitGate {
    reached: Notify,
    release: Notify,
}

impl CommitGate {
    /// Wait until a session has finished its statements and is about to commit.
    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    /// Let the parked commit proceed.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn park(&self) {
        self.reached.notify_one();
        self.release.notified().await;
    }
}

#[derive(Debug, Default)]
struct FaultInjector {
    armed: StdMutex<HashSet<FaultPoint>>,
    gate: StdMutex<Option<Arc<CommitGate>>>,
}

impl FaultInjector {
    fn arm(&self, point: FaultPoint) {
        if let Ok(mut armed) = self.armed.lock() {
            armed.insert(point);
        }
    }

    fn set_gate(&self, gate: Arc<CommitGate>) {
        if let Ok(mut slot) = self.gate.lock() {
            *slot = Some(gate);
        }
    }

    fn take_gate(&self) -> Option<Arc<CommitGate>> {
        self.gate.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Fail once if `point` is armed.
    fn trip(&self, point: FaultPoint) -> Result<()> {
        let fired = self
            .armed
            .lock()
            .map(|mut armed| armed.remove(&point))
            .unwrap_or(false);

        if fired {
            tracing::debug!(?point, "Injected storage fault");
            return Err(StoreError::Database(format!("injected fault at {point:?}")));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: HashMap<String, Account>,
    /// Keyed by `(account_name, item_slug)`.
    ownerships: BTreeMap<(String, String), i64>,
    transfers: Vec<TransferRecord>,
    next_transfer_id: i64,
}

/// In-memory [`Database`].
#[derive(Debug, Clone)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    items: Arc<HashSet<String>>,
    faults: Arc<FaultInjector>,
}

impl MemoryDatabase {
    /// Create an empty database whose item table holds `catalog`.
    #[must_use]
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            items: Arc::new(catalog.items().map(|item| item.slug).collect()),
            faults: Arc::new(FaultInjector::default()),
        }
    }

    /// Make the next call at `point` fail with a database error.
    pub fn inject_fault(&self, point: FaultPoint) {
        self.faults.arm(point);
    }

    /// Park the next commit until the returned gate is released.
    ///
    /// Everything before the commit has already run when
    /// [`CommitGate::reached`] returns; dropping the parked operation then
    /// discards it.
    #[must_use]
    pub fn hold_next_commit(&self) -> Arc<CommitGate> {
        let gate = Arc::new(CommitGate::default());
        self.faults.set_gate(Arc::clone(&gate));
        gate
    }

    /// Committed balance of `name`.
    ///
    /// Waits for any open session to finish.
    pub async fn balance_of(&self, name: &str) -> Option<i64> {
        self.tables
            .lock()
            .await
            .accounts
            .get(name)
            .map(|account| account.balance)
    }

    /// Committed quantity of `item` owned by `account` (`None` if no row).
    ///
    /// Waits for any open session to finish.
    pub async fn quantity_of(&self, account: &str, item: &str) -> Option<i64> {
        self.tables
            .lock()
            .await
            .ownerships
            .get(&(account.to_string(), item.to_string()))
            .copied()
    }

    /// Number of committed transfer records.
    ///
    /// Waits for any open session to finish.
    pub async fn transfer_count(&self) -> usize {
        self.tables.lock().await.transfers.len()
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn Session>> {
        let guard = Arc::clone(&self.tables).lock_owned().await;
        let working = guard.clone();

        Ok(Box::new(MemorySession {
            guard,
            working,
            items: Arc::clone(&self.items),
            faults: Arc::clone(&self.faults),
        }))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

struct MemorySession {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
    items: Arc<HashSet<String>>,
    faults: Arc<FaultInjector>,
}

fn out_of_range(name: &str) -> StoreError {
    StoreError::Database(format!("balance of {name} out of range"))
}

#[async_trait]
impl Session for MemorySession {
    async fn fetch_account(&mut self, name: &str) -> Result<Option<Account>> {
        Ok(self.working.accounts.get(name).cloned())
    }

    async fn insert_account(&mut self, name: &str, secret: &str, balance: i64) -> Result<Account> {
        if balance < 0 {
            return Err(StoreError::constraint(
                constraint::ACCOUNTS_BALANCE_NON_NEGATIVE,
                format!("balance {balance} violates check"),
            ));
        }
        if self.working.accounts.contains_key(name) {
            return Err(StoreError::constraint(
                constraint::ACCOUNTS_PKEY,
                format!("duplicate account name {name}"),
            ));
        }

        let account = Account::new(name, secret, balance);
        self.working
            .accounts
            .insert(name.to_string(), account.clone());
        Ok(account)
    }

    async fn debit_balance(&mut self, name: &str, amount: i64) -> Result<Option<Account>> {
        self.faults.trip(FaultPoint::Debit)?;

        let Some(account) = self.working.accounts.get_mut(name) else {
            return Ok(None);
        };
        let balance = account
            .balance
            .checked_sub(amount)
            .ok_or_else(|| out_of_range(name))?;
        if balance < 0 {
            return Err(StoreError::constraint(
                constraint::ACCOUNTS_BALANCE_NON_NEGATIVE,
                format!("balance of {name} would become {balance}"),
            ));
        }

        account.balance = balance;
        Ok(Some(account.clone()))
    }

    async fn credit_balance(&mut self, name: &str, amount: i64) -> Result<Option<Account>> {
        self.faults.trip(FaultPoint::Credit)?;

        let Some(account) = self.working.accounts.get_mut(name) else {
            return Ok(None);
        };
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| out_of_range(name))?;
        if account.balance < 0 {
            return Err(StoreError::constraint(
                constraint::ACCOUNTS_BALANCE_NON_NEGATIVE,
                format!("balance of {name} would become {}", account.balance),
            ));
        }
        Ok(Some(account.clone()))
    }

    async fn upsert_ownership(&mut self, account: &str, item: &str) -> Result<Ownership> {
        self.faults.trip(FaultPoint::GrantItem)?;

        if !self.working.accounts.contains_key(account) {
            return Err(StoreError::constraint(
                constraint::OWNERSHIPS_FK_ACCOUNT,
                format!("account {account} is not present"),
            ));
        }
        if !self.items.contains(item) {
            return Err(StoreError::constraint(
                constraint::OWNERSHIPS_FK_ITEM,
                format!("item {item} is not present"),
            ));
        }

        let quantity = self
            .working
            .ownerships
            .entry((account.to_string(), item.to_string()))
            .and_modify(|quantity| *quantity += 1)
            .or_insert(1);

        Ok(Ownership {
            account_name: account.to_string(),
            item_slug: item.to_string(),
            quantity: *quantity,
        })
    }

    async fn insert_transfer(
        &mut self,
        sender: &str,
        recipient: &str,
        amount: i64,
    ) -> Result<TransferRecord> {
        self.faults.trip(FaultPoint::RecordTransfer)?;

        if amount <= 0 {
            return Err(StoreError::constraint(
                constraint::TRANSFERS_AMOUNT_POSITIVE,
                format!("amount {amount} violates check"),
            ));
        }
        if !self.working.accounts.contains_key(sender) {
            return Err(StoreError::constraint(
                constraint::TRANSFERS_FK_SENDER,
                format!("sender {sender} is not present"),
            ));
        }
        if !self.working.accounts.contains_key(recipient) {
            return Err(StoreError::constraint(
                constraint::TRANSFERS_FK_RECIPIENT,
                format!("recipient {recipient} is not present"),
            ));
        }

        self.working.next_transfer_id += 1;
        let record = TransferRecord {
            id: self.working.next_transfer_id,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            amount,
            created_at: Utc::now(),
        };
        self.working.transfers.push(record.clone());
        Ok(record)
    }

    async fn load_user_info(&mut self, name: &str) -> Result<Option<UserInfo>> {
        let Some(account) = self.working.accounts.get(name) else {
            return Ok(None);
        };

        let mut info = UserInfo::empty(&account.name, account.balance);
        info.inventory = self
            .working
            .ownerships
            .iter()
            .filter(|((owner, _), _)| owner == name)
            .map(|((_, item), quantity)| InventoryItem {
                item: item.clone(),
                quantity: *quantity,
            })
            .collect();

        for record in &self.working.transfers {
            if record.recipient == name {
                info.coin_history.received.push(ReceivedCoins {
                    from_user: record.sender.clone(),
                    amount: record.amount,
                });
            }
            if record.sender == name {
                info.coin_history.sent.push(SentCoins {
                    to_user: record.recipient.clone(),
                    amount: record.amount,
                });
            }
        }

        Ok(Some(info))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if let Some(gate) = self.faults.take_gate() {
            gate.park().await;
        }
        self.faults.trip(FaultPoint::Commit)?;

        let MemorySession {
            mut guard, working, ..
        } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
