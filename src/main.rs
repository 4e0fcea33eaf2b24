//! Transfer Service
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Config  │───▶│  Store   │───▶│  Engine  │───▶│ Gateway  │
//! │  (YAML)  │    │(PG / mem)│    │(Transfer)│    │  (HTTP)  │
//! └──────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```
//!
//! Usage: `transfer-service [--env dev] [--port 8080]`

use std::sync::Arc;

use anyhow::Context;

use transfer_service::account::{AccountStore, MemoryAccountStore, PgAccountStore};
use transfer_service::config::AppConfig;
use transfer_service::db::Database;
use transfer_service::gateway::{self, state::AppState};
use transfer_service::logging::init_logging;
use transfer_service::transfer::TransferEngine;

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

/// Get port override from command line (--port argument)
fn get_port_override() -> Option<u16> {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if args[i] == "--port" && i + 1 < args.len() {
            return args[i + 1].parse().ok();
        }
    }
    None
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let mut app_config = AppConfig::load(&env)?;
    if let Some(port) = get_port_override() {
        app_config.gateway.port = port;
    }
    let _log_guard = init_logging(&app_config).context("Failed to initialize logging")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("BUILD_GIT_HASH"),
        "Starting transfer service in {} mode",
        env
    );

    match app_config.postgres_url.clone() {
        Some(url) => {
            let db = Database::connect(&url, &app_config.database)
                .await
                .context("Failed to connect to PostgreSQL")?;

            let mut store = PgAccountStore::new(db.pool().clone());
            if let Some(lock_timeout) = app_config.database.lock_timeout() {
                store = store.with_lock_timeout(lock_timeout);
            }
            if app_config.database.auto_migrate {
                store
                    .ensure_schema()
                    .await
                    .context("Failed to create accounts table")?;
            }
            let created = store
                .provision(&app_config.seed_accounts)
                .await
                .context("Failed to provision seed accounts")?;
            tracing::info!(created, "Seed accounts provisioned");

            serve(&app_config, store).await
        }
        None => {
            tracing::warn!("No postgres_url configured, using in-memory account store");
            let store = MemoryAccountStore::new();
            let created = store.provision(&app_config.seed_accounts);
            tracing::info!(created, "Seed accounts provisioned");

            serve(&app_config, store).await
        }
    }
}

async fn serve<S: AccountStore>(app_config: &AppConfig, store: S) -> anyhow::Result<()> {
    let engine = TransferEngine::new(Arc::new(store)).with_timeout(app_config.transfer.timeout());
    let state = Arc::new(AppState::new(Arc::new(engine)));

    gateway::run_server(&app_config.gateway, state)
        .await
        .context("Gateway server error")?;

    tracing::info!("Transfer service stopped");
    Ok(())
}
