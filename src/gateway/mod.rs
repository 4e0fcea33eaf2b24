pub mod handlers;
pub mod middleware;
pub mod state;
pub mod types;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;

use crate::account::AccountStore;
use crate::config::GatewayConfig;
use state::AppState;

/// Build the HTTP router for one account store
pub fn router<S: AccountStore>(state: Arc<AppState<S>>) -> Router {
    let app = Router::new()
        // Health check
        .route("/api/v1/health", get(handlers::health_check::<S>))
        // Account + transfer API
        .route("/api/v1/balance", get(handlers::get_balance::<S>))
        .route("/api/v1/transfer", post(handlers::create_transfer::<S>));

    // [SECURITY] Direct balance adjustment - only compiled when 'mock-api' feature is enabled.
    // Production builds MUST be compiled with `--no-default-features` to exclude this.
    #[cfg(feature = "mock-api")]
    let app = app.nest(
        "/api/v1/internal",
        Router::new().route("/adjust", post(handlers::adjust_balance::<S>)),
    );

    app.layer(axum::middleware::from_fn(middleware::trace_request))
        .with_state(state)
}

/// Start HTTP Gateway server. Returns after ctrl-c.
pub async fn run_server<S: AccountStore>(
    config: &GatewayConfig,
    state: Arc<AppState<S>>,
) -> std::io::Result<()> {
    let store_name = state.engine.store().name();
    let app = router(state);

    // Bind address
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.inspect_err(|e| {
        tracing::error!(
            %addr,
            error = %e,
            "Failed to bind gateway, port {} may already be in use",
            config.port
        );
    })?;

    tracing::info!(%addr, store = store_name, "Gateway listening");
    tracing::info!("Transfer API: POST /api/v1/transfer, GET /api/v1/balance?id=N");
    #[cfg(feature = "mock-api")]
    tracing::warn!("mock-api enabled: POST /api/v1/internal/adjust is exposed");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections");
}
