//! Shared application router builder.
//!
//! Provides [`build_app_router`] so both the production binary (`main.rs`)
//! and integration tests (`tests/common/mod.rs`) use the exact same middleware
//! stack.

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use breedid_core::media::MAX_BATCH_FILES;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::ServerConfig;
use crate::routes;
use crate::state::AppState;
use crate::storage::{PROCESSED_IMAGES_PREFIX, PROCESSED_VIDEOS_PREFIX, UPLOADS_PREFIX};

/// Headroom on top of the file payloads for multipart framing and text fields.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the full application [`Router`] with all middleware layers.
///
/// The middleware stack is applied bottom-up:
///
/// 1. CORS
/// 2. Set request ID on incoming requests
/// 3. Structured request/response tracing
/// 4. Propagate request ID to response
/// 5. Request timeout
/// 6. Panic recovery (catch panics, return 500)
/// 7. Request body ceiling sized for a full batch upload
pub fn build_app_router(state: AppState, config: &ServerConfig) -> Router {
    let cors = build_cors_layer(config);
    let request_id_header = HeaderName::from_static("x-request-id");
    let body_limit = config.max_upload_bytes * MAX_BATCH_FILES + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        // Health check and stream proxy at root level.
        .merge(routes::health::router())
        .merge(routes::proxy::router())
        // API routes.
        .nest("/api", routes::api_routes())
        // Stored originals and annotated outputs.
        .nest_service(
            &format!("/{UPLOADS_PREFIX}"),
            ServeDir::new(&config.upload_root),
        )
        .nest_service(
            &format!("/{PROCESSED_IMAGES_PREFIX}"),
            ServeDir::new(config.public_root.join(PROCESSED_IMAGES_PREFIX)),
        )
        .nest_service(
            &format!("/{PROCESSED_VIDEOS_PREFIX}"),
            ServeDir::new(config.public_root.join(PROCESSED_VIDEOS_PREFIX)),
        )
        // -- Middleware stack (applied bottom-up) --
        .layer(DefaultBodyLimit::max(body_limit))
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state)
}

/// Router for the dedicated `WSS_PORT` listener: only the stream proxy.
///
/// No request timeout is applied since tunnels are long-lived.
pub fn build_proxy_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::proxy::router())
        .nest("/api", routes::proxy::router())
        .layer(CatchPanicLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics if any configured origin is invalid.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
