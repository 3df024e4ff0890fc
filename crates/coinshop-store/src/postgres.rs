//! PostgreSQL storage backend.
//!
//! Each [`Session`] wraps one `sqlx` transaction. Dropping a session without
//! committing rolls the transaction back when the connection returns to the
//! pool.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};

use coinshop_core::{
    Account, Catalog, CoinHistory, InventoryItem, Ownership, ReceivedCoins, SentCoins,
    TransferRecord, UserInfo,
};

use crate::error::{Result, StoreError};
use crate::schema::table;
use crate::{Database, Session};

/// Embedded schema migrations.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// PostgreSQL-backed [`Database`].
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    /// Connect a pool and wait until the server answers.
    ///
    /// The server is pinged up to `retries` times, sleeping 1s, 2s, ... between
    /// attempts, so the service can start alongside its database.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server never answers.
    pub async fn connect(url: &str, max_connections: u32, retries: u32) -> Result<Self> {
        tracing::info!(max_connections, "Connecting to database");

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy(url)?;
        let db = Self { pool };

        let attempts = retries.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            match db.ping().await {
                Ok(()) => {
                    tracing::info!(attempt, "Database connection verified");
                    return Ok(db);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Database ping failed");
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_secs(u64::from(attempt))).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| StoreError::Database("database unreachable".into())))
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    /// Mirror `catalog` into the `catalog_items` table.
    ///
    /// Items are inserted or re-priced; items no longer in the catalog are kept
    /// because ownership rows may still reference them.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn sync_catalog(&self, catalog: &Catalog) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for item in catalog.items() {
            sqlx::query(&format!(
                "INSERT INTO {} (slug, price) VALUES ($1, $2) \
                 ON CONFLICT (slug) DO UPDATE SET price = EXCLUDED.price",
                table::CATALOG_ITEMS
            ))
            .bind(&item.slug)
            .bind(item.price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!(items = catalog.len(), "Catalog synchronized");
        Ok(())
    }
}

#[async_trait]
impl Database for PgDatabase {
    async fn begin(&self) -> Result<Box<dyn Session>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSession { tx }))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

struct PgSession {
    tx: Transaction<'static, Postgres>,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    name: String,
    secret: String,
    balance: i64,
    created_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            name: row.name,
            secret: row.secret,
            balance: row.balance,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OwnershipRow {
    account_name: String,
    item_slug: String,
    quantity: i64,
}

#[derive(sqlx::FromRow)]
struct TransferRow {
    id: i64,
    sender: String,
    recipient: String,
    amount: i64,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct UserInfoRow {
    name: String,
    balance: i64,
    inventory: Json<Vec<InventoryItem>>,
    received: Json<Vec<ReceivedCoins>>,
    sent: Json<Vec<SentCoins>>,
}

const ACCOUNT_COLUMNS: &str = "name, secret, balance, created_at";

#[async_trait]
impl Session for PgSession {
    async fn fetch_account(&mut self, name: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {} WHERE name = $1",
            table::ACCOUNTS
        ))
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn insert_account(&mut self, name: &str, secret: &str, balance: i64) -> Result<Account> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "INSERT INTO {} (name, secret, balance) VALUES ($1, $2, $3) \
             RETURNING {ACCOUNT_COLUMNS}",
            table::ACCOUNTS
        ))
        .bind(name)
        .bind(secret)
        .bind(balance)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row.into())
    }

    async fn debit_balance(&mut self, name: &str, amount: i64) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE {} SET balance = balance - $1 WHERE name = $2 \
             RETURNING {ACCOUNT_COLUMNS}",
            table::ACCOUNTS
        ))
        .bind(amount)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn credit_balance(&mut self, name: &str, amount: i64) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "UPDATE {} SET balance = balance + $1 WHERE name = $2 \
             RETURNING {ACCOUNT_COLUMNS}",
            table::ACCOUNTS
        ))
        .bind(amount)
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn upsert_ownership(&mut self, account: &str, item: &str) -> Result<Ownership> {
        let row = sqlx::query_as::<_, OwnershipRow>(
            r"
            INSERT INTO ownerships (account_name, item_slug, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT (account_name, item_slug) DO UPDATE
                SET quantity = ownerships.quantity + 1
            RETURNING account_name, item_slug, quantity
            ",
        )
        .bind(account)
        .bind(item)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(Ownership {
            account_name: row.account_name,
            item_slug: row.item_slug,
            quantity: row.quantity,
        })
    }

    async fn insert_transfer(
        &mut self,
        sender: &str,
        recipient: &str,
        amount: i64,
    ) -> Result<TransferRecord> {
        let row = sqlx::query_as::<_, TransferRow>(
            r"
            INSERT INTO transfers (sender, recipient, amount)
            VALUES ($1, $2, $3)
            RETURNING id, sender, recipient, amount, created_at
            ",
        )
        .bind(sender)
        .bind(recipient)
        .bind(amount)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(TransferRecord {
            id: row.id,
            sender: row.sender,
            recipient: row.recipient,
            amount: row.amount,
            created_at: row.created_at,
        })
    }

    async fn load_user_info(&mut self, name: &str) -> Result<Option<UserInfo>> {
        let row = sqlx::query_as::<_, UserInfoRow>(
            r"
            SELECT
                a.name,
                a.balance,
                COALESCE(
                    (SELECT json_agg(json_build_object('type', o.item_slug, 'quantity', o.quantity)
                                     ORDER BY o.item_slug)
                     FROM ownerships o
                     WHERE o.account_name = a.name),
                    '[]'::json
                ) AS inventory,
                COALESCE(
                    (SELECT json_agg(json_build_object('fromUser', t.sender, 'amount', t.amount)
                                     ORDER BY t.id)
                     FROM transfers t
                     WHERE t.recipient = a.name),
                    '[]'::json
                ) AS received,
                COALESCE(
                    (SELECT json_agg(json_build_object('toUser', t.recipient, 'amount', t.amount)
                                     ORDER BY t.id)
                     FROM transfers t
                     WHERE t.sender = a.name),
                    '[]'::json
                ) AS sent
            FROM accounts a
            WHERE a.name = $1
            ",
        )
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.map(|row| UserInfo {
            name: row.name,
            coins: row.balance,
            inventory: row.inventory.0,
            coin_history: CoinHistory {
                received: row.received.0,
                sent: row.sent.0,
            },
        }))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
