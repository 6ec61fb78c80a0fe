use std::sync::Arc;

use breedid_inference::{InferenceApi, UpstreamClient};

use crate::config::ServerConfig;
use crate::proxy::TunnelRegistry;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: breedid_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// HTTP client for one-shot photo and video predictions.
    pub inference: InferenceApi,
    /// Connector for the upstream detection stream.
    pub upstream: UpstreamClient,
    /// Plain client used by the HTTP proxy fallback.
    pub http_client: reqwest::Client,
    /// Live proxy tunnels (browser socket <-> upstream socket).
    pub tunnels: Arc<TunnelRegistry>,
}

impl AppState {
    /// Wire up collaborators from configuration.
    pub fn new(pool: breedid_db::DbPool, config: ServerConfig) -> Self {
        let inference = InferenceApi::new(config.ai_service_url.clone());
        let upstream = UpstreamClient::new(config.py_ws_url.clone());
        Self {
            pool,
            config: Arc::new(config),
            inference,
            upstream,
            http_client: reqwest::Client::new(),
            tunnels: Arc::new(TunnelRegistry::new()),
        }
    }
}
