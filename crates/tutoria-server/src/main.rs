//! Tutoria server - web entry point over the data-access facade
//!
//! Serves a single placeholder route; the router state already carries the
//! `DataManager` so real route handlers can be mounted next to it.

use anyhow::Context;
use axum::{routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tutoria_core::config::Config;
use tutoria_core::manager::DataManager;
use tutoria_core::storage::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "tutoria-server")]
#[command(author, version, about = "Persistence service for tutoring chats", long_about = None)]
struct Cli {
    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Database file path (overrides the config file)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

/// Shared router state
#[derive(Clone)]
struct AppState {
    #[allow(dead_code)] // consumed by route handlers as they are mounted
    manager: DataManager,
}

/// Build the application router around the facade
fn router(manager: DataManager) -> Router {
    Router::new()
        .route("/", get(index))
        .with_state(AppState { manager })
}

async fn index() -> &'static str {
    "Hello, World!"
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    let port = cli.port.unwrap_or(config.server.port);
    let database_path = cli.database.unwrap_or_else(|| config.database_path());

    info!(path = %database_path.display(), "Opening database");
    let db = Database::new(DatabaseConfig::with_path(&database_path))
        .await
        .context("Failed to open database")?;
    db.health_check().await?;

    let app = router(DataManager::new(db));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod main_tests;
