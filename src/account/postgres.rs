//! PostgreSQL Account Store
//!
//! Accounts live in a single `accounts` table. Locked reads use
//! `SELECT ... FOR UPDATE`; balance mutation is a relative
//! `UPDATE ... SET balance = balance + $1` whose row count is reported back.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info};

use super::models::Account;
use super::store::{AccountStore, AccountTx, StoreError};
use crate::core_types::{AccountId, Amount};

const CREATE_ACCOUNTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id      BIGINT PRIMARY KEY,
    balance NUMERIC NOT NULL DEFAULT 0 CHECK (balance >= 0)
)
"#;

/// PostgreSQL-backed account store
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
    /// Applied as `SET LOCAL lock_timeout` on every transaction
    lock_timeout: Option<Duration>,
}

impl PgAccountStore {
    /// Create a new PgAccountStore with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: None,
        }
    }

    /// Bound the time a transaction may wait on a row lock
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = Some(lock_timeout);
        self
    }

    /// Create the `accounts` table if it does not exist
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_ACCOUNTS_TABLE).execute(&self.pool).await?;
        info!("accounts table ready");
        Ok(())
    }

    /// Insert accounts that do not exist yet. Existing balances are left untouched.
    ///
    /// Returns the number of accounts created.
    pub async fn provision(&self, accounts: &[Account]) -> Result<u64, StoreError> {
        let mut created = 0;
        for account in accounts {
            let result = sqlx::query(
                "INSERT INTO accounts (id, balance) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
            )
            .bind(account.id)
            .bind(account.balance)
            .execute(&self.pool)
            .await?;
            created += result.rows_affected();
        }
        Ok(created)
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    type Tx = PgAccountTx;

    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn read_balance(&self, account_id: AccountId) -> Result<Option<Amount>, StoreError> {
        let balance = sqlx::query_scalar::<_, Amount>("SELECT balance FROM accounts WHERE id = $1")
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(balance)
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let mut tx = self.pool.begin().await?;

        if let Some(limit) = self.lock_timeout {
            // SET does not take bind parameters
            let stmt = format!("SET LOCAL lock_timeout = {}", limit.as_millis());
            sqlx::query(&stmt).execute(&mut *tx).await?;
        }

        Ok(PgAccountTx { tx })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Open PostgreSQL transaction.
///
/// `sqlx::Transaction` rolls back on drop, so an abandoned handle never
/// leaves the transaction open.
pub struct PgAccountTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AccountTx for PgAccountTx {
    async fn read_balance_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Amount>, StoreError> {
        let balance = sqlx::query_scalar::<_, Amount>(
            "SELECT balance FROM accounts WHERE id = $1 FOR UPDATE",
        )
        .bind(account_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(balance)
    }

    async fn adjust_balance(
        &mut self,
        account_id: AccountId,
        delta: Amount,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE accounts SET balance = balance + $1 WHERE id = $2")
            .bind(delta)
            .bind(account_id)
            .execute(&mut *self.tx)
            .await?;
        debug!(account_id, %delta, rows = result.rows_affected(), "balance adjusted");
        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
