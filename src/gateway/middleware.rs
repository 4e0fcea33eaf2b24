//! Request middleware
//!
//! Every request gets a request id (taken from `x-request-id` or a fresh
//! ULID), a tracing span carrying it, one access log line and the id echoed
//! back in the response headers. A panicking handler is turned into a 500
//! with the usual `{code, msg}` envelope instead of a dropped connection.

use std::panic::AssertUnwindSafe;
use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures::FutureExt;
use tracing::{Instrument, error, info, info_span};

use super::types::{ApiError, error_codes};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn trace_request(request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| ulid::Ulid::new().to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let span = info_span!("request", %request_id, %method, %path);

    async move {
        let started = Instant::now();
        let mut response = match AssertUnwindSafe(next.run(request)).catch_unwind().await {
            Ok(response) => response,
            Err(_) => {
                error!("handler panicked");
                ApiError::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    error_codes::INTERNAL_ERROR,
                    "Internal error",
                )
                .into_response()
            }
        };

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );
        response
    }
    .instrument(span)
    .await
}
