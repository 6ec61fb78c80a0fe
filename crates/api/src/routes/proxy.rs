use axum::routing::any;
use axum::Router;

use crate::proxy;
use crate::state::AppState;

/// The stream proxy path. Mounted both at the root and under `/api`.
pub const STREAM_PATH: &str = "/predict/stream";

/// Any method on the stream path: WebSocket upgrades are tunnelled, other
/// requests are forwarded over HTTP.
pub fn router() -> Router<AppState> {
    Router::new().route(STREAM_PATH, any(proxy::stream_proxy))
}
