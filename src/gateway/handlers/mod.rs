//! HTTP handlers
//!
//! Every handler is generic over the account store so the same router serves
//! PostgreSQL and the in-memory store.

mod account;
mod health;
mod transfer;

pub use account::get_balance;
#[cfg(feature = "mock-api")]
pub use account::adjust_balance;
pub use health::health_check;
pub use transfer::create_transfer;

use axum::extract::rejection::{JsonRejection, QueryRejection};

use super::types::ApiError;

/// Malformed bodies are client input errors, whatever axum's default status
pub(crate) fn json_rejection(e: JsonRejection) -> ApiError {
    ApiError::bad_request(format!("Invalid JSON: {}", e.body_text()))
}

/// Missing or non-numeric query parameters, same envelope as bad bodies
pub(crate) fn query_rejection(e: QueryRejection) -> ApiError {
    ApiError::bad_request(format!("Invalid query: {}", e.body_text()))
}
