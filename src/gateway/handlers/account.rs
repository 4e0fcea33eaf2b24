//! Account balance handlers

use std::sync::Arc;

use axum::extract::{Query, State, rejection::QueryRejection};

use super::super::state::AppState;
use super::super::types::{ApiResult, BalanceData, BalanceQuery, ok};
use crate::account::AccountStore;

#[cfg(feature = "mock-api")]
use axum::{Json, extract::rejection::JsonRejection};

#[cfg(feature = "mock-api")]
use super::super::types::AdjustRequest;

/// Get committed balance
///
/// GET /api/v1/balance?id=N
pub async fn get_balance<S: AccountStore>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<BalanceQuery>, QueryRejection>,
) -> ApiResult<BalanceData> {
    let Query(query) = query.map_err(super::query_rejection)?;
    let balance = state.engine.balance(query.id).await?;
    ok(BalanceData {
        id: query.id,
        balance,
    })
}

/// Apply a signed balance adjustment (funding/test helper)
///
/// POST /api/v1/internal/adjust
#[cfg(feature = "mock-api")]
pub async fn adjust_balance<S: AccountStore>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<AdjustRequest>, JsonRejection>,
) -> ApiResult<BalanceData> {
    let Json(req) = payload.map_err(super::json_rejection)?;
    let balance = state.engine.adjust_balance(req.id, req.delta.inner()).await?;
    ok(BalanceData {
        id: req.id,
        balance,
    })
}
