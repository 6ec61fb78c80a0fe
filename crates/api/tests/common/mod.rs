#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::{Method, Request, Response};
use axum::Router;
use breedid_api::auth::jwt::JwtConfig;
use breedid_api::config::{ServerConfig, TrialFlow};
use breedid_api::router::build_app_router;
use breedid_api::state::AppState;
use breedid_core::usage::QuotaPolicy;
use breedid_inference::InferenceApi;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tempfile::TempDir;
use tower::ServiceExt;

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "breedid-test-boundary";

/// Base64 of the bytes `annotated`, used as a mock processed image.
pub const ANNOTATED_B64: &str = "YW5ub3RhdGVk";

/// Build a test `ServerConfig` rooted in the given directories.
///
/// The inference service URL points at a closed port unless overridden.
pub fn test_config(upload_root: PathBuf, public_root: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        wss_port: None,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-access-secret-0123456789".to_string(),
            refresh_secret: "integration-test-refresh-secret-0123456789".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_days: 7,
        },
        ai_service_url: "http://127.0.0.1:9".to_string(),
        py_ws_url: "ws://127.0.0.1:9/predict/stream".to_string(),
        node_base_url: "http://localhost:3000".to_string(),
        upload_root,
        public_root,
        max_upload_bytes: 1024 * 1024,
        quota: QuotaPolicy {
            photo_per_week: 2,
            video_per_week: 1,
        },
        trial_flow: TrialFlow::Implicit,
        model_name: "YOLOv8".to_string(),
        media_retention_days: 30,
        enable_cleanup_job: false,
        secure_cookies: false,
    }
}

/// A fully wired application over temporary storage roots.
pub struct TestApp {
    pub state: AppState,
    pub uploads: TempDir,
    pub public: TempDir,
}

impl TestApp {
    pub fn new(pool: PgPool) -> Self {
        Self::build(pool, |_| {})
    }

    /// Point the prediction client at `base_url` with short timeouts.
    pub fn with_inference(pool: PgPool, base_url: &str) -> Self {
        let base_url = base_url.to_string();
        Self::build(pool, move |config| config.ai_service_url = base_url)
    }

    pub fn build(pool: PgPool, customize: impl FnOnce(&mut ServerConfig)) -> Self {
        let uploads = tempfile::tempdir().expect("tempdir");
        let public = tempfile::tempdir().expect("tempdir");
        let mut config = test_config(uploads.path().to_path_buf(), public.path().to_path_buf());
        customize(&mut config);

        let mut state = AppState::new(pool, config);
        state.inference = InferenceApi::new(state.config.ai_service_url.clone())
            .with_timeouts(Duration::from_millis(500), Duration::from_millis(500));

        Self {
            state,
            uploads,
            public,
        }
    }

    /// The router with the production middleware stack.
    pub fn router(&self) -> Router {
        build_app_router(self.state.clone(), &self.state.config)
    }

    pub fn pool(&self) -> &PgPool {
        &self.state.pool
    }
}

/// Count regular files anywhere below `dir`.
pub fn count_files(dir: &std::path::Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|e| {
            let path = e.path();
            if path.is_dir() {
                count_files(&path)
            } else {
                1
            }
        })
        .sum()
}

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// How a multipart request identifies its caller.
pub enum Caller<'a> {
    Bearer(&'a str),
    /// Anonymous browser: forwarded IP, user agent and optional cookie.
    Device {
        ip: &'a str,
        user_agent: &'a str,
        cookie: Option<&'a str>,
    },
}

pub async fn post_multipart(app: Router, uri: &str, caller: Caller<'_>, body: Vec<u8>) -> Response<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    builder = match caller {
        Caller::Bearer(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
        Caller::Device {
            ip,
            user_agent,
            cookie,
        } => {
            let builder = builder
                .header("x-forwarded-for", ip)
                .header("user-agent", user_agent);
            match cookie {
                Some(cookie) => builder.header(COOKIE, cookie),
                None => builder,
            }
        }
    };
    send(app, builder.body(Body::from(body)).unwrap()).await
}

/// One file part of a multipart body.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub mime: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> FilePart<'a> {
    pub fn file(filename: &'a str, mime: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            field: "file",
            filename,
            mime,
            bytes,
        }
    }
}

/// Encode file and text parts as `multipart/form-data` with [`BOUNDARY`].
pub fn multipart_body(files: &[FilePart<'_>], fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for file in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                file.field, file.filename, file.mime
            )
            .as_bytes(),
        );
        body.extend_from_slice(file.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Account helpers
// ---------------------------------------------------------------------------

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Register through the API and log in, returning `(user_id, access, refresh)`.
pub async fn register_and_login(app: &TestApp, email: &str) -> (i64, String, String) {
    let response = post_json(
        app.router(),
        "/api/auth/register",
        serde_json::json!({ "username": "tester", "email": email, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), 201);

    let response = post_json(
        app.router(),
        "/api/auth/login",
        serde_json::json!({ "email": email, "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), 200);
    let json = body_json(response).await;
    (
        json["data"]["user"]["id"].as_i64().unwrap(),
        json["data"]["access_token"].as_str().unwrap().to_string(),
        json["data"]["refresh_token"].as_str().unwrap().to_string(),
    )
}
