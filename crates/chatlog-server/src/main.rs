//! # chatlog-server
//!
//! HTTP backend for the chat log.
//!
//! This binary provides:
//! - **REST API** (axum) for chats, messages, calls and the user profile
//! - **Fixture seeding** so a fresh install has demo data to show
//! - A choice of **SQLite** or **in-memory** document storage

mod api;
mod config;
mod error;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use chatlog_service::Services;
use chatlog_store::{Database, DocumentStore, MemoryStore, SqliteStore};

use crate::api::AppState;
use crate::config::{ServerConfig, StorageBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,chatlog_server=debug")),
        )
        .init();

    info!("Starting chatlog server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Build the storage adapter (connects lazily on first use)
    // -----------------------------------------------------------------------
    let store = open_store(&config)?;
    info!(backend = store.name(), "Storage adapter ready");

    let services = Services::new(store);

    // -----------------------------------------------------------------------
    // 4. Optional demo data
    // -----------------------------------------------------------------------
    if config.seed_on_start {
        match services.seeder.seed_if_empty().await? {
            Some(counts) => info!(
                chats = counts.chats,
                calls = counts.calls,
                "Seeded empty database at startup"
            ),
            None => info!("Database already has chats, skipping startup seed"),
        }
    }

    let app_state = AppState {
        services,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}

fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.storage {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::Sqlite => {
            let path = match &config.database_path {
                Some(path) => path.clone(),
                None => Database::default_path()?,
            };
            info!(path = %path.display(), "Using SQLite database");
            Arc::new(SqliteStore::new(path))
        }
    };
    Ok(store)
}
