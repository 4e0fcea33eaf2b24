//! Transfer Engine States
//!
//! ```text
//! VALIDATING → RESERVED → IN_TRANSACTION → RESOLVED
//!      ↓                                       ↑
//!      └───────────── (rejected) ──────────────┘
//! ```
//!
//! States are not persisted. They only label log lines so one transfer can be
//! followed through the engine.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferState {
    /// Client input and advisory balance check
    Validating,
    /// Source amount held in the pending-transfer tracker
    Reserved,
    /// Locked two-row update running inside a store transaction
    InTransaction,
    /// Terminal: outcome known, reservation released
    Resolved,
}

impl TransferState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Resolved)
    }

    /// Whether a reservation is held in this state
    #[inline]
    pub fn holds_reservation(&self) -> bool {
        matches!(self, TransferState::Reserved | TransferState::InTransaction)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Validating => "VALIDATING",
            TransferState::Reserved => "RESERVED",
            TransferState::InTransaction => "IN_TRANSACTION",
            TransferState::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_and_reservation() {
        assert!(TransferState::Resolved.is_terminal());
        assert!(!TransferState::InTransaction.is_terminal());
        assert!(TransferState::Reserved.holds_reservation());
        assert!(TransferState::InTransaction.holds_reservation());
        assert!(!TransferState::Validating.holds_reservation());
        assert!(!TransferState::Resolved.holds_reservation());
    }

    #[test]
    fn test_display() {
        assert_eq!(TransferState::InTransaction.to_string(), "IN_TRANSACTION");
    }
}
