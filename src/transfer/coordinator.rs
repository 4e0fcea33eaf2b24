//! Transaction Coordinator
//!
//! Runs a unit of work inside one store transaction. Exactly one of commit or
//! rollback happens:
//!
//! | unit of work  | action   | returned                                     |
//! |---------------|----------|----------------------------------------------|
//! | `Ok(v)`       | commit   | `Ok(v)`, or `TransactionCommit` on failure   |
//! | `Err(e)`      | rollback | `e`, or `RollbackFailed { cause: e, .. }`    |
//! | panics        | rollback | the panic is resumed after rollback          |
//!
//! If the future returned by [`TransactionCoordinator::within_transaction`] is
//! dropped mid-flight, the transaction handle is dropped with it and the store
//! rolls back.

use std::panic::{AssertUnwindSafe, resume_unwind};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{error, warn};

use super::error::TransferError;
use crate::account::{AccountStore, AccountTx};

pub struct TransactionCoordinator<S: AccountStore> {
    store: Arc<S>,
}

impl<S: AccountStore> TransactionCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Begin a transaction, run `work` against it, then commit or roll back.
    ///
    /// Nested calls are not supported: `work` must only use the handle it is given.
    pub async fn within_transaction<T, F>(&self, work: F) -> Result<T, TransferError>
    where
        T: Send,
        F: for<'t> FnOnce(&'t mut S::Tx) -> BoxFuture<'t, Result<T, TransferError>> + Send,
    {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(|e| TransferError::TransactionBegin(e.to_string()))?;

        let outcome = AssertUnwindSafe(work(&mut tx)).catch_unwind().await;

        match outcome {
            Ok(Ok(value)) => {
                tx.commit()
                    .await
                    .map_err(|e| TransferError::TransactionCommit(e.to_string()))?;
                Ok(value)
            }
            Ok(Err(cause)) => match tx.rollback().await {
                Ok(()) => Err(cause),
                Err(e) => {
                    error!(error = %e, cause = %cause, "rollback failed");
                    Err(TransferError::RollbackFailed {
                        cause: Box::new(cause),
                        detail: e.to_string(),
                    })
                }
            },
            Err(panic) => {
                warn!(store = self.store.name(), "unit of work panicked, rolling back");
                if let Err(e) = tx.rollback().await {
                    error!(error = %e, "rollback after panic failed");
                }
                resume_unwind(panic)
            }
        }
    }
}
