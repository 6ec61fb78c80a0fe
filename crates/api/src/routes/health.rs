//! Liveness check, mounted at the root rather than under `/api`.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when PostgreSQL does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    pub stream_tunnels: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = breedid_db::health_check(&state.pool).await.is_ok();
    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        stream_tunnels: state.tunnels.tunnel_count().await,
    })
}

/// ```text
/// GET /health   database reachability and open stream tunnels
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
