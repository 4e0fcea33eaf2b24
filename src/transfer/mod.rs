//! Transfer consistency engine
//!
//! Moves funds between two accounts so that no account is ever overdrawn and
//! both balances change together or not at all.
//!
//! # Architecture
//!
//! ```text
//! TransferEngine ──validate/reserve──▶ PendingTransfers   (advisory, in memory)
//!       │
//!       └──within_transaction──▶ TransactionCoordinator ──▶ AccountStore
//!                                  (locked read, update)     (authoritative)
//! ```
//!
//! # Safety Invariants
//!
//! 1. **Authoritative check under lock**: the debit is decided by the balance
//!    read with an exclusive row lock, never by the in-memory estimate alone
//! 2. **Ordered locking**: rows are locked in ascending account id order
//! 3. **Release always**: every reservation is released exactly once, on
//!    success, failure, panic or cancellation
//! 4. **Rollback always**: a transaction that does not commit is rolled back

pub mod coordinator;
pub mod engine;
pub mod error;
pub mod pending;
pub mod state;
pub mod types;


// Re-exports for convenience
pub use coordinator::TransactionCoordinator;
pub use engine::TransferEngine;
pub use error::{ErrorKind, TransferError};
pub use pending::{PendingStats, PendingTransfers, Reservation};
pub use state::TransferState;
pub use types::{TransferId, TransferIntent, TransferReceipt};
