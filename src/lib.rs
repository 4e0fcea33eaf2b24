//! Transfer Service - Consistent Account-to-Account Transfers
//!
//! Moves funds between accounts held in PostgreSQL without ever overdrawing a
//! source account, even under concurrent transfers from the same account.
//!
//! # Modules
//!
//! - [`core_types`] - Core type definitions (AccountId, Amount)
//! - [`config`] - YAML application configuration
//! - [`logging`] - tracing subscriber setup
//! - [`db`] - PostgreSQL connection pool
//! - [`account`] - Account model and stores (PostgreSQL, in-memory)
//! - [`transfer`] - Pending-transfer tracker, transaction coordinator, engine
//! - [`gateway`] - axum HTTP API

// Core types - must be first!
pub mod core_types;

// Infrastructure
pub mod config;
pub mod db;
pub mod logging;

// Domain
pub mod account;
pub mod transfer;

// HTTP API
pub mod gateway;

// Convenient re-exports at crate root
pub use account::{Account, AccountStore, AccountTx, MemoryAccountStore, PgAccountStore};
pub use core_types::{AccountId, Amount};
pub use transfer::{
    ErrorKind, PendingTransfers, TransactionCoordinator, TransferEngine, TransferError,
    TransferReceipt,
};
