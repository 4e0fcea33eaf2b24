//! Transfer Core Types

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;

use super::error::TransferError;
use crate::core_types::{AccountId, Amount};

/// Transfer ID - ULID, used to correlate log lines of one transfer.
/// Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransferId(ulid::Ulid);

impl TransferId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TransferId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for TransferId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One requested movement of funds.
///
/// Construction validates the client input, so an intent that exists is
/// always for a positive amount between two different accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferIntent {
    pub transfer_id: TransferId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

impl TransferIntent {
    pub fn new(from: AccountId, to: AccountId, amount: Amount) -> Result<Self, TransferError> {
        if amount <= Decimal::ZERO {
            return Err(TransferError::InvalidAmount);
        }
        if from == to {
            return Err(TransferError::SameAccount);
        }
        Ok(Self {
            transfer_id: TransferId::new(),
            from,
            to,
            amount,
        })
    }

    /// Both account ids, lowest first. Row locks are taken in this order.
    pub fn lock_order(&self) -> [AccountId; 2] {
        if self.from < self.to {
            [self.from, self.to]
        } else {
            [self.to, self.from]
        }
    }
}

/// Result of a committed transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub transfer_id: TransferId,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
    /// Source balance right after commit
    pub from_balance: Amount,
    /// Target balance right after commit
    pub to_balance: Amount,
    /// Milliseconds since epoch
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_rejects_non_positive_amount() {
        assert!(matches!(
            TransferIntent::new(1, 2, Decimal::ZERO),
            Err(TransferError::InvalidAmount)
        ));
        assert!(matches!(
            TransferIntent::new(1, 2, Decimal::new(-5, 0)),
            Err(TransferError::InvalidAmount)
        ));
    }

    #[test]
    fn test_intent_rejects_same_account() {
        assert!(matches!(
            TransferIntent::new(3, 3, Decimal::ONE),
            Err(TransferError::SameAccount)
        ));
    }

    #[test]
    fn test_lock_order_is_ascending() {
        let forward = TransferIntent::new(1, 2, Decimal::ONE).unwrap();
        let backward = TransferIntent::new(2, 1, Decimal::ONE).unwrap();
        assert_eq!(forward.lock_order(), [1, 2]);
        assert_eq!(backward.lock_order(), [1, 2]);
    }

    #[test]
    fn test_transfer_id_roundtrip() {
        let id = TransferId::new();
        let parsed: TransferId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
