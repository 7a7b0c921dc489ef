//! streamtriage -- playback source triage and auto-selection for
//! multi-source streaming.
//!
//! This crate resolves a requested title/episode to the best playable
//! stream: it probes candidate sources, scores them on resolution,
//! throughput, and latency, synchronizes overlay commentary tracks to the
//! playing episode, and persists watch progress and favorites.

pub mod api;
pub mod catalog;
pub mod config;
pub mod overlay;
pub mod player;
pub mod probe;
pub mod scoring;
pub mod session;
pub mod storage;

use anyhow::Result;

use crate::config::TriageConfig;

/// Start the streamtriage daemon: HTTP API over selection and watch history.
pub async fn serve(bind: &str, config: TriageConfig) -> Result<()> {
    let db_path = config.storage.db_path.display().to_string();
    tracing::info!(%db_path, "Initializing database");
    let pool = storage::open_pool(&db_path)?;

    let addr: std::net::SocketAddr = bind.parse()?;
    let app = api::router(api::AppState { pool, config });

    tracing::info!(%addr, "streamtriage listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
