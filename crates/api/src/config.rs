use std::path::PathBuf;

use breedid_core::media::DEFAULT_MAX_UPLOAD_BYTES;
use breedid_core::reclamation::DEFAULT_MEDIA_RETENTION_DAYS;
use breedid_core::usage::{QuotaPolicy, DEFAULT_PHOTO_WEEKLY_LIMIT, DEFAULT_VIDEO_WEEKLY_LIMIT};

use crate::auth::jwt::JwtConfig;

/// How unauthenticated callers obtain their one-time trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialFlow {
    /// The first anonymous prediction issues the trial on the spot.
    Implicit,
    /// Anonymous predictions are rejected until `POST /api/trial/start`.
    Explicit,
}

impl TrialFlow {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "implicit" => Some(TrialFlow::Implicit),
            "explicit" => Some(TrialFlow::Explicit),
            _ => None,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Optional second listener serving only the stream proxy.
    pub wss_port: Option<u16>,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. Must exceed the video inference timeout.
    pub request_timeout_secs: u64,
    /// JWT token configuration (secrets, expiry durations).
    pub jwt: JwtConfig,
    /// Base HTTP URL of the inference service.
    pub ai_service_url: String,
    /// WebSocket URL of the inference stream.
    pub py_ws_url: String,
    /// Public base URL prefixed to stored media paths.
    pub node_base_url: String,
    /// Directory holding uploaded originals, served at `/uploads`.
    pub upload_root: PathBuf,
    /// Directory holding `processed-images/` and `processed-videos/`.
    pub public_root: PathBuf,
    pub max_upload_bytes: usize,
    /// Weekly ceilings for the `user` role.
    pub quota: QuotaPolicy,
    pub trial_flow: TrialFlow,
    /// Recorded on each prediction history row.
    pub model_name: String,
    /// Age after which soft-deleted media are physically purged.
    pub media_retention_days: i64,
    pub enable_cleanup_job: bool,
    /// Mark cookies `Secure` (true when `APP_ENV=production`).
    pub secure_cookies: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                              |
    /// |------------------------|--------------------------------------|
    /// | `HOST`                 | `0.0.0.0`                            |
    /// | `PORT`                 | `3000`                               |
    /// | `WSS_PORT`             | unset                                |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`              |
    /// | `REQUEST_TIMEOUT_SECS` | `330`                                |
    /// | `AI_SERVICE_URL`       | `http://localhost:8000`              |
    /// | `PY_WS_URL`            | `AI_SERVICE_URL` as ws + `/predict/stream` |
    /// | `NODE_BASE_URL`        | `http://localhost:{PORT}`            |
    /// | `UPLOAD_ROOT`          | `uploads`                            |
    /// | `PUBLIC_ROOT`          | `public`                             |
    /// | `MAX_UPLOAD_BYTES`     | `20971520`                           |
    /// | `PHOTO_WEEKLY_LIMIT`   | `100`                                |
    /// | `VIDEO_WEEKLY_LIMIT`   | `5`                                  |
    /// | `TRIAL_FLOW`           | `implicit`                           |
    /// | `MODEL_NAME`           | `YOLOv8`                             |
    /// | `MEDIA_RETENTION_DAYS` | `30`                                 |
    /// | `ENABLE_CLEANUP_JOB`   | `false`                              |
    /// | `APP_ENV`              | `development`                        |
    ///
    /// # Panics
    ///
    /// Panics on malformed values so misconfiguration fails at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let wss_port: Option<u16> = std::env::var("WSS_PORT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.parse().expect("WSS_PORT must be a valid u16"));

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = parse_or("REQUEST_TIMEOUT_SECS", 330);

        let ai_service_url = std::env::var("AI_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:8000".into())
            .trim_end_matches('/')
            .to_string();

        let py_ws_url = std::env::var("PY_WS_URL").unwrap_or_else(|_| {
            breedid_inference::UpstreamClient::from_http_base(&ai_service_url)
                .ws_url()
                .to_string()
        });

        let node_base_url = std::env::var("NODE_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let trial_flow = match std::env::var("TRIAL_FLOW") {
            Ok(v) => TrialFlow::parse(&v).expect("TRIAL_FLOW must be `implicit` or `explicit`"),
            Err(_) => TrialFlow::Implicit,
        };

        let enable_cleanup_job = std::env::var("ENABLE_CLEANUP_JOB")
            .map(|v| matches!(v.trim(), "true" | "1" | "yes"))
            .unwrap_or(false);

        let secure_cookies = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        Self {
            host,
            port,
            wss_port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            ai_service_url,
            py_ws_url,
            node_base_url,
            upload_root: std::env::var("UPLOAD_ROOT")
                .unwrap_or_else(|_| "uploads".into())
                .into(),
            public_root: std::env::var("PUBLIC_ROOT")
                .unwrap_or_else(|_| "public".into())
                .into(),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            quota: QuotaPolicy {
                photo_per_week: parse_or("PHOTO_WEEKLY_LIMIT", DEFAULT_PHOTO_WEEKLY_LIMIT),
                video_per_week: parse_or("VIDEO_WEEKLY_LIMIT", DEFAULT_VIDEO_WEEKLY_LIMIT),
            },
            trial_flow,
            model_name: std::env::var("MODEL_NAME").unwrap_or_else(|_| "YOLOv8".into()),
            media_retention_days: parse_or("MEDIA_RETENTION_DAYS", DEFAULT_MEDIA_RETENTION_DAYS),
            enable_cleanup_job,
            secure_cookies,
        }
    }
}

/// Parse an optional numeric env var, panicking on a malformed value.
fn parse_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid number: {e}")),
        Err(_) => default,
    }
}

/// Config with fixed secrets and the given storage roots, for unit tests.
#[cfg(test)]
pub(crate) fn test_config(upload_root: &std::path::Path, public_root: &std::path::Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        wss_port: None,
        cors_origins: vec!["http://localhost:5173".into()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "unit-test-secret-that-is-long-enough".into(),
            refresh_secret: "unit-test-refresh-secret-long-enough".into(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        ai_service_url: "http://127.0.0.1:9".into(),
        py_ws_url: "ws://127.0.0.1:9/predict/stream".into(),
        node_base_url: "http://localhost:3000".into(),
        upload_root: upload_root.to_path_buf(),
        public_root: public_root.to_path_buf(),
        max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        quota: QuotaPolicy::default(),
        trial_flow: TrialFlow::Implicit,
        model_name: "YOLOv8".into(),
        media_retention_days: DEFAULT_MEDIA_RETENTION_DAYS,
        enable_cleanup_job: false,
        secure_cookies: false,
    }
}
