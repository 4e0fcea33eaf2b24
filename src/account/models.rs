//! Data models for account storage

use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, Amount};

/// Account row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub balance: Amount,
}

impl Account {
    pub fn new(id: AccountId, balance: Amount) -> Self {
        Self { id, balance }
    }

    /// Whether the balance covers a debit of `amount`
    pub fn covers(&self, amount: Amount) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_covers() {
        let account = Account::new(1, Decimal::new(100, 0));
        assert!(account.covers(Decimal::new(100, 0)));
        assert!(account.covers(Decimal::new(9999, 2)));
        assert!(!account.covers(Decimal::new(10001, 2)));
    }

    #[test]
    fn test_serde_balance_as_string() {
        let account = Account::new(7, Decimal::new(1050, 2));
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, r#"{"id":7,"balance":"10.50"}"#);
    }
}
