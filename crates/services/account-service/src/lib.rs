//! Account Service Library
//!
//! Registers users and provisions bank accounts for them over HTTP.
//! Runs against PostgreSQL, or against the in-process store when the
//! database URL is `memory://`.

pub mod api;
pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::api::{create_router, AppState};
use crate::config::ServiceConfig;
use crate::infra::{Database, MemoryStore, Persistence};

/// Run migrations (for CLI commands).
pub async fn run_migrations(action: MigrateAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::from_env();
    if config.database.is_memory() {
        return Err("migrations need a database server, not the in-memory store".into());
    }
    let db = Database::connect_without_migrations(&config.database).await?;

    match action {
        MigrateAction::Up => {
            db.run_migrations().await?;
            info!("Migrations applied successfully");
        }
        MigrateAction::Down => {
            db.rollback_migration().await?;
            info!("Rolled back last migration");
        }
        MigrateAction::Status => {
            let status = db.migration_status().await?;
            for (name, applied) in status {
                let marker = if applied { "[x]" } else { "[ ]" };
                println!("{} {}", marker, name);
            }
        }
        MigrateAction::Fresh => {
            db.fresh_migrations().await?;
            info!("Database reset and migrations applied");
        }
    }

    Ok(())
}

/// Migration action type.
#[derive(Debug, Clone, Copy)]
pub enum MigrateAction {
    Up,
    Down,
    Status,
    Fresh,
}

/// Build the application state for the configured store.
pub async fn build_state(config: &ServiceConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    if config.database.is_memory() {
        info!("Using in-memory store");
        return Ok(AppState::from_unit_of_work(Arc::new(MemoryStore::new())));
    }

    let db = Database::connect(&config.database).await?;
    Ok(AppState::from_unit_of_work(Arc::new(Persistence::new(db))))
}

/// Run the HTTP server with the given configuration.
pub async fn run_server(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config).await?;
    let app = create_router(state);

    let addr: SocketAddr = config.server.addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Account service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
