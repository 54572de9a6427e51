//! BreachWatch -- data breach tracking and reporting service.
//!
//! This crate provides breach record storage, the aggregation engine behind
//! the trend reports, saved analyses, and the HTTP API that exposes them.

pub mod analysis;
pub mod api;
pub mod config;
pub mod error;
pub mod predict;
pub mod records;
pub mod storage;

use anyhow::{Context, Result};

use crate::api::state::AppState;
use crate::config::Config;

/// Start the BreachWatch API server.
pub async fn serve(config: Config) -> Result<()> {
    // 1. Initialize Storage
    let db_path = &config.storage.database_path;
    tracing::info!(db_path = %db_path.display(), "Initializing database");
    let pool = storage::open_pool(db_path)?;

    // 2. Build shared state
    let state = AppState::new(pool, &config)?;
    tracing::info!(predictor = state.predictor.url(), "Prediction service configured");

    // 3. Start API Server
    let addr: std::net::SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {:?}", config.server.bind))?;
    let app = api::router(state);

    tracing::info!(%addr, "BreachWatch listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
