//! In-memory Account Store
//!
//! Mirrors the locking semantics the engine relies on from PostgreSQL:
//! - `read_balance` sees committed balances only and never blocks
//! - `read_balance_for_update` / `adjust_balance` take a per-row exclusive lock
//!   that is held until the transaction commits, rolls back or is dropped
//! - writes are staged inside the transaction and applied on commit
//!
//! Used when no PostgreSQL URL is configured and throughout the test suite.
//! Operation counters and fault switches let tests observe exactly what the
//! engine did to the store.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tokio::sync::{Mutex as RowLock, OwnedMutexGuard};

use super::models::Account;
use super::store::{AccountStore, AccountTx, StoreError};
use crate::core_types::{AccountId, Amount};

struct Row {
    /// Committed balance
    balance: Mutex<Amount>,
    /// Exclusive row lock, owned by at most one open transaction
    lock: Arc<RowLock<()>>,
}

impl Row {
    fn new(balance: Amount) -> Self {
        Self {
            balance: Mutex::new(balance),
            lock: Arc::new(RowLock::new(())),
        }
    }

    fn committed(&self) -> Amount {
        *self.balance.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Default)]
struct Counters {
    reads: AtomicUsize,
    begins: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
}

#[derive(Default)]
struct Faults {
    fail_begin: AtomicBool,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    panic_on_adjust: AtomicBool,
    zero_rows_for: Mutex<Option<AccountId>>,
}

#[derive(Default)]
struct Inner {
    rows: RwLock<FxHashMap<AccountId, Arc<Row>>>,
    counters: Counters,
    faults: Faults,
}

impl Inner {
    fn row(&self, account_id: AccountId) -> Option<Arc<Row>> {
        self.rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&account_id)
            .cloned()
    }
}

/// Snapshot of store operation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemoryStoreStats {
    /// Unlocked point reads
    pub reads: usize,
    pub begins: usize,
    pub commits: usize,
    /// Explicit rollbacks plus transactions dropped while still open
    pub rollbacks: usize,
}

/// Row-locking in-process account store
#[derive(Clone, Default)]
pub struct MemoryAccountStore {
    inner: Arc<Inner>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given accounts
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let store = Self::new();
        for account in accounts {
            store.insert(account);
        }
        store
    }

    /// Insert an account if the id is free. Returns false if it already exists.
    pub fn insert(&self, account: Account) -> bool {
        let mut rows = self
            .inner
            .rows
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if rows.contains_key(&account.id) {
            return false;
        }
        rows.insert(account.id, Arc::new(Row::new(account.balance)));
        true
    }

    /// Insert accounts that do not exist yet. Returns the number created.
    pub fn provision(&self, accounts: &[Account]) -> u64 {
        accounts
            .iter()
            .filter(|account| self.insert((*account).clone()))
            .count() as u64
    }

    /// Committed balance, without touching the read counter
    pub fn balance(&self, account_id: AccountId) -> Option<Amount> {
        self.inner.row(account_id).map(|row| row.committed())
    }

    /// Sum of all committed balances, clamped to the decimal range
    pub fn total(&self) -> Amount {
        self.inner
            .rows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .fold(Decimal::ZERO, |sum, row| sum.saturating_add(row.committed()))
    }

    /// Whether some open transaction holds the row lock
    pub fn is_locked(&self, account_id: AccountId) -> bool {
        self.inner
            .row(account_id)
            .is_some_and(|row| row.lock.try_lock().is_err())
    }

    pub fn stats(&self) -> MemoryStoreStats {
        let counters = &self.inner.counters;
        MemoryStoreStats {
            reads: counters.reads.load(Ordering::SeqCst),
            begins: counters.begins.load(Ordering::SeqCst),
            commits: counters.commits.load(Ordering::SeqCst),
            rollbacks: counters.rollbacks.load(Ordering::SeqCst),
        }
    }

    pub fn set_fail_begin(&self, fail: bool) {
        self.inner.faults.fail_begin.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_commit(&self, fail: bool) {
        self.inner.faults.fail_commit.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_rollback(&self, fail: bool) {
        self.inner.faults.fail_rollback.store(fail, Ordering::SeqCst);
    }

    /// Make `adjust_balance` panic, simulating a fault inside a unit of work
    pub fn set_panic_on_adjust(&self, panic: bool) {
        self.inner.faults.panic_on_adjust.store(panic, Ordering::SeqCst);
    }

    /// Make `adjust_balance` report zero rows affected for one account,
    /// as if the row vanished mid-transaction
    pub fn set_zero_rows_for(&self, account_id: Option<AccountId>) {
        *self
            .inner
            .faults
            .zero_rows_for
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = account_id;
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    type Tx = MemoryTx;

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn read_balance(&self, account_id: AccountId) -> Result<Option<Amount>, StoreError> {
        self.inner.counters.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance(account_id))
    }

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        if self.inner.faults.fail_begin.load(Ordering::SeqCst) {
            return Err(StoreError::Injected("begin"));
        }
        self.inner.counters.begins.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryTx {
            inner: self.inner.clone(),
            locks: FxHashMap::default(),
            staged: FxHashMap::default(),
            finished: false,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Open in-memory transaction
pub struct MemoryTx {
    inner: Arc<Inner>,
    locks: FxHashMap<AccountId, OwnedMutexGuard<()>>,
    /// Pending balance deltas, applied on commit
    staged: FxHashMap<AccountId, Amount>,
    finished: bool,
}

impl MemoryTx {
    fn staged_delta(&self, account_id: AccountId) -> Amount {
        self.staged
            .get(&account_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Committed balance plus this transaction's own writes
    fn visible(&self, account_id: AccountId, row: &Row) -> Result<Amount, StoreError> {
        row.committed()
            .checked_add(self.staged_delta(account_id))
            .ok_or(StoreError::Overflow(account_id))
    }

    async fn lock_row(&mut self, account_id: AccountId, row: &Row) {
        if !self.locks.contains_key(&account_id) {
            let guard = row.lock.clone().lock_owned().await;
            self.locks.insert(account_id, guard);
        }
    }
}

#[async_trait]
impl AccountTx for MemoryTx {
    async fn read_balance_for_update(
        &mut self,
        account_id: AccountId,
    ) -> Result<Option<Amount>, StoreError> {
        let Some(row) = self.inner.row(account_id) else {
            return Ok(None);
        };
        self.lock_row(account_id, &row).await;
        self.visible(account_id, &row).map(Some)
    }

    async fn adjust_balance(
        &mut self,
        account_id: AccountId,
        delta: Amount,
    ) -> Result<u64, StoreError> {
        let faults = &self.inner.faults;
        if faults.panic_on_adjust.load(Ordering::SeqCst) {
            panic!("injected fault: adjust_balance({account_id})");
        }
        let vanished = *faults
            .zero_rows_for
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            == Some(account_id);
        if vanished {
            return Ok(0);
        }

        let Some(row) = self.inner.row(account_id) else {
            return Ok(0);
        };
        self.lock_row(account_id, &row).await;
        let staged = self.staged_delta(account_id);
        let next = staged
            .checked_add(delta)
            .filter(|next| row.committed().checked_add(*next).is_some())
            .ok_or(StoreError::Overflow(account_id))?;
        self.staged.insert(account_id, next);
        Ok(1)
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        if self.inner.faults.fail_commit.load(Ordering::SeqCst) {
            self.finished = true;
            return Err(StoreError::Injected("commit"));
        }

        // Every row written here is still locked by this transaction, so the
        // values computed now are the ones stored below.
        let mut applied = Vec::with_capacity(self.staged.len());
        for (&account_id, &delta) in &self.staged {
            if let Some(row) = self.inner.row(account_id) {
                let next = row
                    .committed()
                    .checked_add(delta)
                    .ok_or(StoreError::Overflow(account_id))?;
                applied.push((row, next));
            }
        }

        self.finished = true;
        for (row, next) in applied {
            *row.balance.lock().unwrap_or_else(PoisonError::into_inner) = next;
        }
        self.inner.counters.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(mut self) -> Result<(), StoreError> {
        self.finished = true;
        self.inner.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        if self.inner.faults.fail_rollback.load(Ordering::SeqCst) {
            return Err(StoreError::Injected("rollback"));
        }
        Ok(())
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        // Same as sqlx: an open transaction that goes out of scope is rolled back
        if !self.finished {
            self.inner.counters.rollbacks.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn dec(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    fn store() -> MemoryAccountStore {
        MemoryAccountStore::with_accounts([Account::new(1, dec(100)), Account::new(2, dec(50))])
    }

    #[tokio::test]
    async fn test_commit_applies_staged_writes() {
        let store = store();
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.read_balance_for_update(1).await.unwrap(), Some(dec(100)));
        assert_eq!(tx.adjust_balance(1, dec(-30)).await.unwrap(), 1);

        // Own writes visible inside, not outside
        assert_eq!(tx.read_balance_for_update(1).await.unwrap(), Some(dec(70)));
        assert_eq!(store.read_balance(1).await.unwrap(), Some(dec(100)));

        tx.commit().await.unwrap();
        assert_eq!(store.balance(1), Some(dec(70)));
        assert!(!store.is_locked(1));
        assert_eq!(store.stats().commits, 1);
    }

    #[tokio::test]
    async fn test_rollback_and_drop_discard_writes() {
        let store = store();

        let mut tx = store.begin().await.unwrap();
        tx.adjust_balance(2, dec(10)).await.unwrap();
        tx.rollback().await.unwrap();
        assert_eq!(store.balance(2), Some(dec(50)));

        let mut tx = store.begin().await.unwrap();
        tx.adjust_balance(2, dec(10)).await.unwrap();
        assert!(store.is_locked(2));
        drop(tx);
        assert_eq!(store.balance(2), Some(dec(50)));
        assert!(!store.is_locked(2));

        assert_eq!(store.stats().rollbacks, 2);
    }

    #[tokio::test]
    async fn test_row_lock_blocks_second_transaction() {
        let store = store();
        let mut first = store.begin().await.unwrap();
        first.read_balance_for_update(1).await.unwrap();

        let mut second = store.begin().await.unwrap();
        let blocked =
            tokio::time::timeout(Duration::from_millis(50), second.read_balance_for_update(1))
                .await;
        assert!(blocked.is_err(), "second locker must wait");

        // Unlocked reads are never blocked
        assert_eq!(store.read_balance(1).await.unwrap(), Some(dec(100)));

        first.adjust_balance(1, dec(-1)).await.unwrap();
        first.commit().await.unwrap();

        let seen = second.read_balance_for_update(1).await.unwrap();
        assert_eq!(seen, Some(dec(99)));
    }

    #[tokio::test]
    async fn test_missing_account() {
        let store = store();
        assert_eq!(store.read_balance(42).await.unwrap(), None);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.read_balance_for_update(42).await.unwrap(), None);
        assert_eq!(tx.adjust_balance(42, dec(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_injected_faults() {
        let store = store();

        store.set_fail_begin(true);
        assert!(matches!(
            store.begin().await,
            Err(StoreError::Injected("begin"))
        ));
        store.set_fail_begin(false);

        store.set_zero_rows_for(Some(1));
        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.adjust_balance(1, dec(1)).await.unwrap(), 0);
        store.set_zero_rows_for(None);

        store.set_fail_commit(true);
        tx.adjust_balance(2, dec(1)).await.unwrap();
        assert!(tx.commit().await.is_err());
        assert_eq!(store.balance(2), Some(dec(50)));
        assert!(!store.is_locked(2));
    }

    #[tokio::test]
    async fn test_write_past_decimal_range_is_refused() {
        let store = MemoryAccountStore::with_accounts([
            Account::new(1, Decimal::MAX),
            Account::new(2, Decimal::MAX),
        ]);

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.read_balance_for_update(1).await.unwrap(), Some(Decimal::MAX));
        assert!(matches!(
            tx.adjust_balance(1, dec(1)).await,
            Err(StoreError::Overflow(1))
        ));
        // A refused write stages nothing
        assert_eq!(tx.adjust_balance(1, dec(-1)).await.unwrap(), 1);
        tx.commit().await.unwrap();
        assert_eq!(store.balance(1), Some(Decimal::MAX - dec(1)));

        // Summing the table clamps instead of panicking
        assert_eq!(store.total(), Decimal::MAX);
    }

    #[test]
    fn test_provision_keeps_existing_balance() {
        let store = store();
        let created = store.provision(&[Account::new(1, dec(5)), Account::new(3, dec(7))]);
        assert_eq!(created, 1);
        assert_eq!(store.balance(1), Some(dec(100)));
        assert_eq!(store.balance(3), Some(dec(7)));
        assert_eq!(store.total(), dec(157));
    }
}
