//! API route definitions.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::state::AppState;
use crate::catalog::MediaSource;
use crate::probe::HlsProbe;
use crate::scoring::{select_best, SelectError};
use crate::storage;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/select", post(run_selection))
        .route("/records", get(list_records))
        .route("/records/{key}", axum::routing::delete(delete_record))
        .route("/favorites", get(list_favorites))
        .route("/favorites/{key}", axum::routing::delete(delete_favorite))
        .route("/skip/{key}", get(get_skip).put(put_skip).delete(delete_skip))
        .route("/settings/blockad", get(get_block_ad).put(put_block_ad))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, Json<Value>);

fn internal_error(e: anyhow::Error) -> ApiError {
    error!(error = %e, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}

/// Run a synchronous storage call off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| internal_error(e.into()))?
        .map_err(internal_error)
}

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "ok",
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

/// Probe the posted candidates and return the best one plus the full
/// measurement map, so the caller can cache per-source speeds.
async fn run_selection(
    State(state): State<AppState>,
    Json(candidates): Json<Vec<MediaSource>>,
) -> Result<Json<Value>, ApiError> {
    let probe = HlsProbe::with_timeout(Duration::from_secs(state.config.probe.timeout_secs));
    let outcome = select_best(&candidates, &probe, &state.config.scoring)
        .await
        .map_err(|e| match e {
            SelectError::NoCandidates => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            ),
        })?;

    Ok(Json(json!({
        "data": {
            "best": outcome.best.storage_key(),
            "ranking": outcome.ranking,
            "measurements": outcome.measurements,
        },
        "meta": { "candidates": candidates.len() }
    })))
}

async fn list_records(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.clone();
    let records = blocking(move || storage::get_all_play_records(&pool)).await?;
    let total = records.len();
    let data: Vec<Value> = records
        .into_iter()
        .map(|(key, record)| json!({ "key": key, "record": record }))
        .collect();
    Ok(Json(json!({ "data": data, "meta": { "total": total } })))
}

async fn delete_record(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.clone();
    let target = key.clone();
    blocking(move || storage::delete_play_record(&pool, &target)).await?;
    Ok(Json(json!({ "data": { "deleted": key } })))
}

async fn list_favorites(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.clone();
    let favorites = blocking(move || storage::get_all_favorites(&pool)).await?;
    let total = favorites.len();
    let data: Vec<Value> = favorites
        .into_iter()
        .map(|(key, favorite)| json!({ "key": key, "favorite": favorite }))
        .collect();
    Ok(Json(json!({ "data": data, "meta": { "total": total } })))
}

async fn delete_favorite(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.clone();
    let target = key.clone();
    blocking(move || storage::delete_favorite(&pool, &target)).await?;
    Ok(Json(json!({ "data": { "deleted": key } })))
}

async fn get_skip(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.clone();
    let config = blocking(move || storage::get_skip_config(&pool, &key)).await?;
    Ok(Json(json!({ "data": config })))
}

async fn put_skip(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(config): Json<crate::player::skip::SkipConfig>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.clone();
    let saved = config.clone();
    blocking(move || storage::save_skip_config(&pool, &key, &saved)).await?;
    Ok(Json(json!({ "data": config })))
}

async fn delete_skip(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.clone();
    let target = key.clone();
    blocking(move || storage::delete_skip_config(&pool, &target)).await?;
    Ok(Json(json!({ "data": { "deleted": key } })))
}

async fn get_block_ad(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.clone();
    let enabled = blocking(move || storage::block_ad_enabled(&pool)).await?;
    Ok(Json(json!({ "data": { "enabled": enabled } })))
}

#[derive(serde::Deserialize)]
struct BlockAdBody {
    enabled: bool,
}

async fn put_block_ad(
    State(state): State<AppState>,
    Json(body): Json<BlockAdBody>,
) -> Result<Json<Value>, ApiError> {
    let pool = state.pool.clone();
    let enabled = body.enabled;
    blocking(move || storage::set_block_ad(&pool, enabled)).await?;
    Ok(Json(json!({ "data": { "enabled": enabled } })))
}
