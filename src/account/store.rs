//! Account Store boundary
//!
//! The transfer engine only talks to storage through these two traits:
//! [`AccountStore`] for unlocked reads and opening transactions, and
//! [`AccountTx`] for everything that must happen under a transaction.
//!
//! Implementations:
//! - [`PgAccountStore`](super::postgres::PgAccountStore) - PostgreSQL `accounts` table
//! - [`MemoryAccountStore`](super::memory::MemoryAccountStore) - row-locking in-process store

use async_trait::async_trait;
use thiserror::Error;

use crate::core_types::{AccountId, Amount};

/// Storage-level failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Balance of the account would leave the decimal range
    #[error("Balance overflow on account {0}")]
    Overflow(AccountId),

    /// Failure produced on purpose by a test store
    #[error("Injected failure: {0}")]
    Injected(&'static str),
}

/// Account table access outside of a transaction
#[async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Transaction handle type
    type Tx: AccountTx;

    /// Store name for logging
    fn name(&self) -> &'static str;

    /// Point read of the committed balance. Takes no lock.
    ///
    /// Returns `None` if the account does not exist.
    async fn read_balance(&self, account_id: AccountId) -> Result<Option<Amount>, StoreError>;

    /// Begin a transaction owning one connection until commit or rollback.
    ///
    /// Dropping the returned handle without committing rolls the transaction back.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Liveness probe
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Operations scoped to a single open transaction
#[async_trait]
pub trait AccountTx: Send {
    /// Read a balance and take an exclusive row lock held until the
    /// transaction ends.
    ///
    /// Returns `None` if the account does not exist (nothing is locked).
    async fn read_balance_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Amount>, StoreError>;

    /// `balance = balance + delta` for one account. Returns rows affected.
    async fn adjust_balance(&mut self, account_id: AccountId, delta: Amount)
    -> Result<u64, StoreError>;

    /// Commit all changes made through this handle
    async fn commit(self) -> Result<(), StoreError>;

    /// Discard all changes made through this handle
    async fn rollback(self) -> Result<(), StoreError>;
}
