//! Pending-Transfer Tracker
//!
//! Process-local sum of amounts held by transfers that are in flight but not
//! yet committed, keyed by source account. Lets a burst of transfers against
//! one account fail fast in memory instead of queueing on the row lock.
//!
//! The check is advisory: it reads the balance without a lock and races with
//! other reservations. The locked read inside the transaction is the one that
//! decides. Nothing here is shared across processes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use tracing::debug;

use super::error::TransferError;
use crate::account::AccountStore;
use crate::core_types::{AccountId, Amount};

/// Reservation counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingStats {
    pub reserved: u64,
    pub released: u64,
}

impl PendingStats {
    /// Reservations currently held
    pub fn outstanding(&self) -> u64 {
        self.reserved.saturating_sub(self.released)
    }
}

#[derive(Default)]
pub struct PendingTransfers {
    reserved: RwLock<FxHashMap<AccountId, Amount>>,
    reserve_count: AtomicU64,
    release_count: AtomicU64,
}

impl PendingTransfers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount currently reserved against an account
    pub fn reserved(&self, account_id: AccountId) -> Amount {
        self.reserved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&account_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Number of accounts with a non-zero reservation
    pub fn accounts_in_flight(&self) -> usize {
        self.reserved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn stats(&self) -> PendingStats {
        // Released first: a snapshot never shows more releases than reservations
        let released = self.release_count.load(Ordering::SeqCst);
        let reserved = self.reserve_count.load(Ordering::SeqCst);
        PendingStats { reserved, released }
    }

    /// Advisory check: reject if `balance - (reserved + amount) < 0`.
    ///
    /// A sum past the decimal range can never be covered, so it is rejected
    /// the same way.
    pub async fn validate<S: AccountStore>(
        &self,
        store: &S,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<(), TransferError> {
        let balance = store
            .read_balance(account_id)
            .await?
            .ok_or(TransferError::SourceAccountNotFound(account_id))?;
        let pending = self.reserved(account_id);

        let headroom = pending
            .checked_add(amount)
            .and_then(|held| balance.checked_sub(held));
        if headroom.is_none_or(|left| left < Decimal::ZERO) {
            debug!(account_id, %balance, %pending, %amount, "advisory check rejected");
            return Err(TransferError::InsufficientFunds {
                balance,
                pending,
                requested: amount,
            });
        }
        Ok(())
    }

    /// Hold `amount` against `account_id` until the returned guard is released
    /// or dropped.
    pub fn reserve(&self, account_id: AccountId, amount: Amount) -> Reservation<'_> {
        {
            let mut reserved = self.reserved.write().unwrap_or_else(PoisonError::into_inner);
            let held = reserved.entry(account_id).or_insert(Decimal::ZERO);
            *held = held.saturating_add(amount);
        }
        self.reserve_count.fetch_add(1, Ordering::SeqCst);
        Reservation {
            tracker: self,
            account_id,
            amount,
        }
    }

    fn release_amount(&self, account_id: AccountId, amount: Amount) {
        {
            let mut reserved = self.reserved.write().unwrap_or_else(PoisonError::into_inner);
            if let Some(held) = reserved.get_mut(&account_id) {
                *held = held.saturating_sub(amount);
                if *held <= Decimal::ZERO {
                    reserved.remove(&account_id);
                }
            }
        }
        self.release_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Release handle for one reservation.
///
/// The decrement happens in `Drop`, so it runs exactly once on every exit
/// path: normal return, early `?` return, panic unwinding and cancellation of
/// the owning future.
#[must_use = "dropping a Reservation releases it immediately"]
pub struct Reservation<'a> {
    tracker: &'a PendingTransfers,
    account_id: AccountId,
    amount: Amount,
}

impl Reservation<'_> {
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    /// Release now
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.tracker.release_amount(self.account_id, self.amount);
    }
}
