//! Gateway types module
//!
//! ## Input Types
//! - [`StrictDecimal`]: Format-validated decimal for API input
//! - [`TransferRequest`], [`BalanceQuery`], [`AdjustRequest`]: request bodies
//!
//! ## Output Types
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`]: Error response with HTTP status
//!
//! ## Submodules
//! - [`money`]: Money types (StrictDecimal)
//! - [`response`]: Response types and error codes

pub mod money;
pub mod response;

use serde::Deserialize;

use crate::core_types::AccountId;

// Re-export commonly used types at module root
pub use money::StrictDecimal;
pub use response::{
    ApiError, ApiResponse, ApiResult, BalanceData, HealthResponse, error_codes, ok,
};

/// Transfer request body
#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub from_id: AccountId,
    pub to_id: AccountId,
    pub amount: StrictDecimal,
}

/// `GET /api/v1/balance?id=N`
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub id: AccountId,
}

/// Direct balance adjustment (mock-api only)
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub id: AccountId,
    /// Signed change to apply
    pub delta: StrictDecimal,
}
