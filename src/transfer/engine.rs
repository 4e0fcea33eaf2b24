//! Transfer Engine
//!
//! Drives one transfer through `VALIDATING → RESERVED → IN_TRANSACTION → RESOLVED`.
//!
//! Two balance checks guard every debit:
//! 1. **Advisory** - [`PendingTransfers::validate`]: unlocked read minus amounts
//!    reserved by in-flight transfers. Cheap, may be stale.
//! 2. **Authoritative** - locked read inside the transaction. Final.
//!
//! Both rows are locked in ascending account id order, so A→B and B→A
//! transfers running at the same time cannot deadlock.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use super::coordinator::TransactionCoordinator;
use super::error::{ErrorKind, TransferError};
use super::pending::PendingTransfers;
use super::state::TransferState;
use super::types::{TransferIntent, TransferReceipt};
use crate::account::{Account, AccountStore, AccountTx};
use crate::core_types::{AccountId, Amount};

pub struct TransferEngine<S: AccountStore> {
    store: Arc<S>,
    pending: PendingTransfers,
    coordinator: TransactionCoordinator<S>,
    /// Deadline for each engine operation
    timeout: Option<Duration>,
}

impl<S: AccountStore> TransferEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            coordinator: TransactionCoordinator::new(store.clone()),
            store,
            pending: PendingTransfers::new(),
            timeout: None,
        }
    }

    /// Abort transfers, balance reads and adjustments that take longer than
    /// `timeout`. An open transaction is rolled back and a held reservation
    /// released.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn pending(&self) -> &PendingTransfers {
        &self.pending
    }

    /// Committed balance of one account
    pub async fn balance(&self, account_id: AccountId) -> Result<Amount, TransferError> {
        self.within_deadline(async {
            self.store
                .read_balance(account_id)
                .await?
                .ok_or(TransferError::AccountNotFound(account_id))
        })
        .await
    }

    /// Move `amount` from `from` to `to`.
    pub async fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Result<TransferReceipt, TransferError> {
        let intent = TransferIntent::new(from, to, amount).inspect_err(|e| {
            debug!(from, to, %amount, error = %e, "transfer rejected: invalid input");
        })?;

        let result = self.within_deadline(self.execute(intent)).await;

        match &result {
            Ok(receipt) => info!(
                transfer_id = %intent.transfer_id,
                from,
                to,
                %amount,
                from_balance = %receipt.from_balance,
                to_balance = %receipt.to_balance,
                "transfer committed"
            ),
            Err(e) if e.kind() == ErrorKind::TransactionFailure => error!(
                transfer_id = %intent.transfer_id,
                from,
                to,
                %amount,
                error = %e,
                "transfer failed"
            ),
            Err(e) => warn!(
                transfer_id = %intent.transfer_id,
                from,
                to,
                %amount,
                code = e.code(),
                error = %e,
                "transfer rejected"
            ),
        }
        result
    }

    async fn execute(&self, intent: TransferIntent) -> Result<TransferReceipt, TransferError> {
        let id = intent.transfer_id;
        trace_state(&intent, TransferState::Validating);
        self.pending
            .validate(self.store.as_ref(), intent.from, intent.amount)
            .await?;

        let reservation = self.pending.reserve(intent.from, intent.amount);
        trace_state(&intent, TransferState::Reserved);
        debug!(
            transfer_id = %id,
            account_id = reservation.account_id(),
            amount = %reservation.amount(),
            "amount reserved"
        );

        trace_state(&intent, TransferState::InTransaction);
        let result = self
            .coordinator
            .within_transaction(move |tx| move_funds(tx, intent).boxed())
            .await;

        reservation.release();
        trace_state(&intent, TransferState::Resolved);
        debug!(transfer_id = %id, ok = result.is_ok(), "reservation released");
        result
    }

    /// Add `delta` to one account's balance under a row lock.
    ///
    /// Refuses any adjustment that would leave the balance negative.
    /// Returns the new balance.
    pub async fn adjust_balance(
        &self,
        account_id: AccountId,
        delta: Amount,
    ) -> Result<Amount, TransferError> {
        if delta.is_zero() {
            return Err(TransferError::InvalidAmount);
        }

        let balance = self
            .within_deadline(
                self.coordinator
                    .within_transaction(move |tx| adjust_one(tx, account_id, delta).boxed()),
            )
            .await
            .inspect_err(|e| warn!(account_id, %delta, error = %e, "balance adjustment failed"))?;

        info!(account_id, %delta, %balance, "balance adjusted");
        Ok(balance)
    }

    /// Run `work` under the configured deadline. Expiry drops `work`, which
    /// rolls back whatever transaction it holds.
    async fn within_deadline<T>(
        &self,
        work: impl Future<Output = Result<T, TransferError>>,
    ) -> Result<T, TransferError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .unwrap_or(Err(TransferError::Timeout(limit))),
            None => work.await,
        }
    }
}

fn trace_state(intent: &TransferIntent, state: TransferState) {
    debug!(
        transfer_id = %intent.transfer_id,
        state = %state,
        holds_reservation = state.holds_reservation(),
        terminal = state.is_terminal(),
        "transfer state"
    );
}

/// Unit of work for one transfer. Runs inside the coordinator's transaction.
async fn move_funds<X: AccountTx>(
    tx: &mut X,
    intent: TransferIntent,
) -> Result<TransferReceipt, TransferError> {
    let TransferIntent {
        transfer_id,
        from,
        to,
        amount,
    } = intent;

    // Lock both rows lowest id first
    let [low, high] = intent.lock_order();
    let low_balance = tx.read_balance_for_update(low).await?;
    let high_balance = tx.read_balance_for_update(high).await?;
    let (from_balance, to_balance) = if from == low {
        (low_balance, high_balance)
    } else {
        (high_balance, low_balance)
    };

    // Authoritative check
    let source = from_balance
        .map(|balance| Account::new(from, balance))
        .ok_or(TransferError::SourceAccountNotFound(from))?;
    if !source.covers(amount) {
        return Err(TransferError::InsufficientBalance {
            available: source.balance,
            requested: amount,
        });
    }
    let target_balance = to_balance.ok_or(TransferError::TargetAccountNotFound(to))?;
    let credited = target_balance
        .checked_add(amount)
        .ok_or(TransferError::AmountOverflow(to))?;

    apply_delta(tx, from, -amount, TransferError::SourceAccountNotFound(from)).await?;
    apply_delta(tx, to, amount, TransferError::TargetAccountNotFound(to)).await?;

    Ok(TransferReceipt {
        transfer_id,
        from,
        to,
        amount,
        from_balance: source.balance - amount,
        to_balance: credited,
        timestamp: chrono::Utc::now().timestamp_millis(),
    })
}

/// Unit of work for a direct balance adjustment
async fn adjust_one<X: AccountTx>(
    tx: &mut X,
    account_id: AccountId,
    delta: Amount,
) -> Result<Amount, TransferError> {
    let balance = tx
        .read_balance_for_update(account_id)
        .await?
        .ok_or(TransferError::AccountNotFound(account_id))?;

    let updated = balance
        .checked_add(delta)
        .ok_or(TransferError::AmountOverflow(account_id))?;
    if updated < Decimal::ZERO {
        return Err(TransferError::InsufficientBalance {
            available: balance,
            requested: -delta,
        });
    }

    apply_delta(tx, account_id, delta, TransferError::AccountNotFound(account_id)).await?;
    Ok(updated)
}

/// Conditional update that must hit exactly one row. Any other row count
/// means the locked row vanished, which row locking should make impossible.
async fn apply_delta<X: AccountTx>(
    tx: &mut X,
    account_id: AccountId,
    delta: Amount,
    not_found: TransferError,
) -> Result<(), TransferError> {
    let rows = tx.adjust_balance(account_id, delta).await?;
    if rows != 1 {
        error!(
            account_id,
            %delta,
            rows,
            "consistency fault: locked account row not updated"
        );
        return Err(not_found);
    }
    Ok(())
}
