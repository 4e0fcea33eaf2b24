//! Transfer handler

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use super::super::state::AppState;
use super::super::types::{ApiResult, TransferRequest, ok};
use crate::account::AccountStore;
use crate::transfer::TransferReceipt;

/// Create transfer endpoint
///
/// POST /api/v1/transfer
///
/// Body: `{from_id, to_id, amount}`. Returns the receipt with both balances
/// after the transfer.
pub async fn create_transfer<S: AccountStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<TransferRequest>, JsonRejection>,
) -> ApiResult<TransferReceipt> {
    let Json(req) = payload.map_err(super::json_rejection)?;
    let receipt = state
        .engine
        .transfer(req.from_id, req.to_id, req.amount.inner())
        .await?;
    ok(receipt)
}
