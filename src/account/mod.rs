//! Account storage
//!
//! The `accounts` table (id, balance) behind the [`AccountStore`] boundary,
//! with a PostgreSQL implementation and an in-memory one.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

// Re-export commonly used types
pub use memory::{MemoryAccountStore, MemoryStoreStats};
pub use models::Account;
pub use postgres::{PgAccountStore, PgAccountTx};
pub use store::{AccountStore, AccountTx, StoreError};
