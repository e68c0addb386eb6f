use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use studio_core::controller::PersistenceMode;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether project changes are persisted or only kept locally.
    pub mode: PersistenceMode,
    /// Whether the database is reachable; `null` when none is configured.
    pub db_healthy: Option<bool>,
    /// Number of projects with changes not yet accepted by the store.
    pub unsynced: usize,
}

/// GET /health -- returns service and database health.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = match &state.pool {
        Some(pool) => Some(studio_db::health_check(pool).await.is_ok()),
        None => None,
    };
    let unsynced = state.controller.unsynced_ids().await.len();

    let status = if db_healthy == Some(false) || unsynced > 0 {
        "degraded"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        mode: state.controller.mode(),
        db_healthy,
        unsynced,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
