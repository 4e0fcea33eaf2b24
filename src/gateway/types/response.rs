//! API Response types and error codes
//!
//! - `ApiResponse<T>`: Unified response wrapper
//! - `ApiError`: Error response carrying its HTTP status
//! - `error_codes`: Standard error code constants
//! - Response DTOs

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::core_types::{AccountId, Amount};
use crate::transfer::TransferError;

// ============================================================================
// Unified API Response Format
// ============================================================================

/// Unified API response wrapper
///
/// All API responses follow this structure:
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: actual data (success) or null (error)
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Response code: 0 for success, non-zero for errors
    pub code: i32,
    /// Response message
    pub msg: String,
    /// Response data (only present when code == 0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create success response
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    /// Create error response
    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

// ============================================================================
// Error Response
// ============================================================================

/// Handler error: HTTP status plus the `{code, msg}` envelope
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, msg: impl Into<String>) -> Self {
        Self {
            status,
            code,
            msg: msg.into(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER, msg)
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            error_codes::SERVICE_UNAVAILABLE,
            msg,
        )
    }
}

impl From<TransferError> for ApiError {
    fn from(e: TransferError) -> Self {
        let status =
            StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, error_codes::for_transfer_error(&e), e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiResponse::<()>::error(self.code, self.msg));
        (self.status, body).into_response()
    }
}

/// Handler result type
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap data in a success response
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Health check response data
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Server timestamp in milliseconds
    pub timestamp_ms: i64,
}

/// Balance query response data
#[derive(Debug, Serialize)]
pub struct BalanceData {
    pub id: AccountId,
    pub balance: Amount,
}

// ============================================================================
// Error Codes
// ============================================================================

/// Standard API error codes
pub mod error_codes {
    use crate::transfer::TransferError;

    // Success
    pub const SUCCESS: i32 = 0;

    // Client errors (1xxx)
    pub const INVALID_PARAMETER: i32 = 1001;
    pub const INSUFFICIENT_BALANCE: i32 = 1002;
    pub const INVALID_AMOUNT: i32 = 1003;
    pub const SAME_ACCOUNT: i32 = 1004;
    pub const AMOUNT_OVERFLOW: i32 = 1005;

    // Resource errors (4xxx)
    pub const ACCOUNT_NOT_FOUND: i32 = 4001;
    pub const SOURCE_ACCOUNT_NOT_FOUND: i32 = 4002;
    pub const TARGET_ACCOUNT_NOT_FOUND: i32 = 4003;

    // Server errors (5xxx)
    pub const INTERNAL_ERROR: i32 = 5000;
    pub const SERVICE_UNAVAILABLE: i32 = 5001;
    pub const TRANSACTION_FAILED: i32 = 5002;
    pub const TIMEOUT: i32 = 5004;

    pub fn for_transfer_error(e: &TransferError) -> i32 {
        match e {
            TransferError::InvalidAmount => INVALID_AMOUNT,
            TransferError::SameAccount => SAME_ACCOUNT,
            TransferError::AmountOverflow(_) => AMOUNT_OVERFLOW,
            TransferError::AccountNotFound(_) => ACCOUNT_NOT_FOUND,
            TransferError::SourceAccountNotFound(_) => SOURCE_ACCOUNT_NOT_FOUND,
            TransferError::TargetAccountNotFound(_) => TARGET_ACCOUNT_NOT_FOUND,
            TransferError::InsufficientFunds { .. } | TransferError::InsufficientBalance { .. } => {
                INSUFFICIENT_BALANCE
            }
            TransferError::TransactionBegin(_)
            | TransferError::TransactionCommit(_)
            | TransferError::RollbackFailed { .. } => TRANSACTION_FAILED,
            TransferError::DatabaseError(_) => INTERNAL_ERROR,
            TransferError::Timeout(_) => TIMEOUT,
        }
    }
}
