//! Transfer Error Types

use std::time::Duration;

use thiserror::Error;

use crate::account::StoreError;
use crate::core_types::{AccountId, Amount};

/// Error classes surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before touching the store or the pending-transfer tracker
    ClientInput,
    /// Account does not exist
    NotFound,
    /// Advisory or authoritative balance check failed
    InsufficientFunds,
    /// Begin, commit or rollback failed
    TransactionFailure,
    /// Store error or deadline expiry
    Internal,
}

/// Transfer error types
#[derive(Error, Debug, Clone)]
pub enum TransferError {
    // === Validation Errors ===
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    #[error("Source and target account cannot be the same")]
    SameAccount,

    /// Applying the amount would exceed the representable balance range
    #[error("Amount overflows the balance of account {0}")]
    AmountOverflow(AccountId),

    // === Account Errors ===
    #[error("Account {0} not found")]
    AccountNotFound(AccountId),

    #[error("Source account {0} not found")]
    SourceAccountNotFound(AccountId),

    #[error("Target account {0} not found")]
    TargetAccountNotFound(AccountId),

    /// Advisory rejection by the pending-transfer tracker
    #[error(
        "Insufficient funds considering pending transfers (balance: {balance}, pending: {pending}, requested: {requested})"
    )]
    InsufficientFunds {
        balance: Amount,
        pending: Amount,
        requested: Amount,
    },

    /// Authoritative rejection under the row lock
    #[error("Insufficient balance (available: {available}, requested: {requested})")]
    InsufficientBalance {
        available: Amount,
        requested: Amount,
    },

    // === Transaction Errors ===
    #[error("Failed to begin transaction: {0}")]
    TransactionBegin(String),

    #[error("Failed to commit transaction: {0}")]
    TransactionCommit(String),

    /// Rollback after a failed unit of work also failed. The original failure
    /// is kept as the error source.
    #[error("Rollback failed: {detail} (original error: {cause})")]
    RollbackFailed {
        #[source]
        cause: Box<TransferError>,
        detail: String,
    },

    // === System Errors ===
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Transfer timed out after {0:?}")]
    Timeout(Duration),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::InvalidAmount
            | TransferError::SameAccount
            | TransferError::AmountOverflow(_) => ErrorKind::ClientInput,
            TransferError::AccountNotFound(_)
            | TransferError::SourceAccountNotFound(_)
            | TransferError::TargetAccountNotFound(_) => ErrorKind::NotFound,
            TransferError::InsufficientFunds { .. } | TransferError::InsufficientBalance { .. } => {
                ErrorKind::InsufficientFunds
            }
            TransferError::TransactionBegin(_)
            | TransferError::TransactionCommit(_)
            | TransferError::RollbackFailed { .. } => ErrorKind::TransactionFailure,
            TransferError::DatabaseError(_) | TransferError::Timeout(_) => ErrorKind::Internal,
        }
    }

    /// True when the rejection came from the in-memory tracker rather than
    /// the locked database read
    pub fn is_advisory(&self) -> bool {
        matches!(self, TransferError::InsufficientFunds { .. })
    }

    /// Get the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount => "INVALID_AMOUNT",
            TransferError::SameAccount => "SAME_ACCOUNT",
            TransferError::AmountOverflow(_) => "AMOUNT_OVERFLOW",
            TransferError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            TransferError::SourceAccountNotFound(_) => "SOURCE_ACCOUNT_NOT_FOUND",
            TransferError::TargetAccountNotFound(_) => "TARGET_ACCOUNT_NOT_FOUND",
            TransferError::InsufficientFunds { .. } | TransferError::InsufficientBalance { .. } => {
                "INSUFFICIENT_BALANCE"
            }
            TransferError::TransactionBegin(_)
            | TransferError::TransactionCommit(_)
            | TransferError::RollbackFailed { .. } => "TRANSACTION_FAILED",
            TransferError::DatabaseError(_) => "DATABASE_ERROR",
            TransferError::Timeout(_) => "TIMEOUT",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self.kind() {
            ErrorKind::ClientInput => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::InsufficientFunds => 422,
            ErrorKind::TransactionFailure => 500,
            ErrorKind::Internal => match self {
                TransferError::Timeout(_) => 504,
                _ => 500,
            },
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Overflow(account_id) => TransferError::AmountOverflow(account_id),
            other => TransferError::DatabaseError(other.to_string()),
        }
    }
}
