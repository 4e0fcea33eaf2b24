//! Core types used throughout the system

/// Account ID - primary key of the `accounts` table.
///
/// # Constraints:
/// - **Immutable**: Once assigned, NEVER changes
/// - **Ordered**: Row locks are always taken in ascending id order
pub type AccountId = i64;

/// Monetary amount. Balances and transfer amounts share the same decimal type
/// the database column maps to (`NUMERIC`).
pub type Amount = rust_decimal::Decimal;
