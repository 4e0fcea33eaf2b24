//! Health check handler

use std::sync::Arc;

use axum::extract::State;

use super::super::state::AppState;
use super::super::types::{ApiError, ApiResult, HealthResponse, ok};
use crate::account::AccountStore;

/// Health check endpoint
///
/// GET /api/v1/health
///
/// - Healthy: 200 OK + {code: 0, data: {timestamp_ms}}
/// - Store unreachable: 503 Service Unavailable + {code: 5001, msg: "unavailable"}
///
/// Store errors are logged, never exposed in the response.
pub async fn health_check<S: AccountStore>(
    State(state): State<Arc<AppState<S>>>,
) -> ApiResult<HealthResponse> {
    let store = state.engine.store();
    store.ping().await.map_err(|e| {
        tracing::error!(store = store.name(), error = %e, "[HEALTH] store ping failed");
        ApiError::service_unavailable("unavailable")
    })?;
    ok(HealthResponse {
        timestamp_ms: chrono::Utc::now().timestamp_millis(),
    })
}
