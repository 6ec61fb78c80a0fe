use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use breedid_api::config::ServerConfig;
use breedid_api::router::{build_app_router, build_proxy_router};
use breedid_api::state::AppState;
use breedid_api::storage::{PROCESSED_IMAGES_PREFIX, PROCESSED_VIDEOS_PREFIX};
use breedid_api::{background, proxy};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "breedid_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = %config.port,
        wss_port = ?config.wss_port,
        ai_service_url = %config.ai_service_url,
        trial_flow = ?config.trial_flow,
        "Loaded server configuration"
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = breedid_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    breedid_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    breedid_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Storage roots ---
    for dir in [
        config.upload_root.clone(),
        config.public_root.join(PROCESSED_IMAGES_PREFIX),
        config.public_root.join(PROCESSED_VIDEOS_PREFIX),
    ] {
        tokio::fs::create_dir_all(&dir)
            .await
            .unwrap_or_else(|e| panic!("Failed to create {}: {e}", dir.display()));
    }

    // --- App state ---
    let state = AppState::new(pool.clone(), config.clone());
    let tunnels = Arc::clone(&state.tunnels);

    // --- Heartbeat ---
    let heartbeat_handle = proxy::start_heartbeat(Arc::clone(&tunnels));

    // --- Background jobs ---
    let background_cancel = CancellationToken::new();
    let mut background_handles = vec![tokio::spawn(background::trial_retention::run(
        pool.clone(),
        background_cancel.clone(),
    ))];
    if config.enable_cleanup_job {
        background_handles.push(tokio::spawn(background::media_cleanup::run(
            pool.clone(),
            Arc::clone(&state.config),
            background_cancel.clone(),
        )));
    } else {
        tracing::info!("Media cleanup job disabled");
    }

    // --- Dedicated stream proxy listener ---
    let proxy_shutdown = CancellationToken::new();
    let proxy_handle = config.wss_port.map(|wss_port| {
        let addr = SocketAddr::new(
            config.host.parse().expect("Invalid HOST address"),
            wss_port,
        );
        let app = build_proxy_router(state.clone());
        let shutdown = proxy_shutdown.clone();
        tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .expect("Failed to bind stream proxy address");
            tracing::info!(%addr, "Starting stream proxy listener");
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.cancelled().await })
                .await
            {
                tracing::error!(error = %e, "Stream proxy listener failed");
            }
        })
    });

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    let tunnel_count = tunnels.tunnel_count().await;
    tracing::info!(tunnel_count, "Closing remaining stream tunnels");
    tunnels.shutdown_all().await;

    proxy_shutdown.cancel();
    if let Some(handle) = proxy_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    background_cancel.cancel();
    for handle in background_handles {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }
    tracing::info!("Background jobs stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
