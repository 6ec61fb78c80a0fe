use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{CONTENT_TYPE, UPGRADE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use breedid_inference::messages::{request_id_of, ClientFrame, StreamFrame};
use futures::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message as UpstreamMessage;

use super::pending::PendingRequests;
use crate::state::AppState;

/// How often each tunnel looks for requests that outlived their TTL.
const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Entry point for both stream paths.
///
/// WebSocket upgrades become a tunnel; anything else is forwarded over HTTP.
pub async fn stream_proxy(State(state): State<AppState>, request: Request) -> Response {
    if !is_websocket_upgrade(request.headers()) {
        return forward_http(&state, request).await;
    }

    let (mut parts, _body) = request.into_parts();
    let query = parts.uri.query().map(str::to_owned);
    match WebSocketUpgrade::from_request_parts(&mut parts, &state).await {
        Ok(ws) => ws.on_upgrade(move |socket| run_tunnel(socket, state, query)),
        Err(rejection) => rejection.into_response(),
    }
}

fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    headers
        .get(UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

// ---------------------------------------------------------------------------
// HTTP fallback
// ---------------------------------------------------------------------------

/// Path on the inference service for a proxied request path.
pub(crate) fn upstream_path(path: &str) -> &str {
    match path.strip_prefix("/api") {
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

/// Forward a plain HTTP request and relay the upstream status and body.
async fn forward_http(state: &AppState, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    let mut url = format!(
        "{}{}",
        state.config.ai_service_url,
        upstream_path(parts.uri.path())
    );
    if let Some(query) = parts.uri.query() {
        url.push('?');
        url.push_str(query);
    }

    let body = match axum::body::to_bytes(body, state.config.max_upload_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected proxied request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large").into_response();
        }
    };

    let mut upstream = state.http_client.request(parts.method, &url).body(body);
    if let Some(content_type) = parts.headers.get(CONTENT_TYPE) {
        upstream = upstream.header(CONTENT_TYPE, content_type.clone());
    }

    let upstream_response = match upstream.send().await {
        Ok(resp) => resp,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Proxy request to inference service failed");
            return bad_gateway();
        }
    };

    let status = upstream_response.status();
    let content_type = upstream_response.headers().get(CONTENT_TYPE).cloned();
    let bytes = match upstream_response.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Failed to read proxied response body");
            return bad_gateway();
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    response
}

fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, "Bad gateway").into_response()
}

// ---------------------------------------------------------------------------
// WebSocket tunnel
// ---------------------------------------------------------------------------

/// Pump frames between one client socket and a fresh upstream connection.
///
/// The client side is registered with the tunnel registry so heartbeat and
/// shutdown reach it. Three tasks run alongside the client reader loop:
///   1. a writer draining the registry channel into the client sink,
///   2. an upstream reader relaying service frames to the client,
///   3. a sweeper reporting requests that never got an answer.
///
/// When either side closes, everything is torn down.
async fn run_tunnel(mut socket: WebSocket, state: AppState, query: Option<String>) {
    let tunnel_id = uuid::Uuid::new_v4().to_string();

    let upstream = match state.upstream.connect(query.as_deref()).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(tunnel_id = %tunnel_id, error = %e, "Upstream stream unavailable");
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::ERROR,
                    reason: Utf8Bytes::from_static("Upstream unavailable"),
                })))
                .await;
            return;
        }
    };
    tracing::info!(tunnel_id = %tunnel_id, "Stream tunnel opened");

    let (client_tx, mut client_rx) = state.tunnels.add(tunnel_id.clone()).await;
    let (mut client_sink, mut client_stream) = socket.split();
    let (mut upstream_sink, mut upstream_stream) = upstream.split();
    let pending = Arc::new(Mutex::new(PendingRequests::default()));

    // Writer: registry channel -> client socket.
    let writer_id = tunnel_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(msg) = client_rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if client_sink.send(msg).await.is_err() {
                tracing::debug!(tunnel_id = %writer_id, "Client sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Upstream reader: service frames -> client.
    let reader_tx = client_tx.clone();
    let reader_pending = Arc::clone(&pending);
    let reader_id = tunnel_id.clone();
    let upstream_reader = tokio::spawn(async move {
        while let Some(result) = upstream_stream.next().await {
            match result {
                Ok(UpstreamMessage::Text(text)) => {
                    if let Some(request_id) = request_id_of(&text) {
                        reader_pending.lock().await.resolve(&request_id);
                    }
                    if reader_tx.send(Message::Text(text.into())).is_err() {
                        break;
                    }
                }
                Ok(UpstreamMessage::Binary(data)) => {
                    if reader_tx.send(Message::Binary(data.into())).is_err() {
                        break;
                    }
                }
                Ok(UpstreamMessage::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(tunnel_id = %reader_id, error = %e, "Upstream receive error");
                    break;
                }
            }
        }
        let _ = reader_tx.send(Message::Close(None));
    });

    // Sweeper: report tracked requests past their TTL.
    let sweeper_tx = client_tx.clone();
    let sweeper_pending = Arc::clone(&pending);
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let expired = sweeper_pending.lock().await.evict_expired(Instant::now());
            for request_id in expired {
                let frame = StreamFrame::expired(request_id).to_json();
                if sweeper_tx.send(Message::Text(frame.into())).is_err() {
                    return;
                }
            }
        }
    });

    // Client reader: client frames -> service.
    while let Some(result) = client_stream.next().await {
        let forwarded = match result {
            Ok(Message::Text(text)) => {
                let text = text.as_str();
                match serde_json::from_str::<ClientFrame>(text) {
                    Ok(ClientFrame::Ping) => {
                        let _ = client_tx.send(Message::Text(StreamFrame::Pong.to_json().into()));
                        continue;
                    }
                    Ok(ClientFrame::Frame { meta, .. }) => {
                        if let Some(request_id) = meta.and_then(|m| m.request_id) {
                            pending.lock().await.track(request_id, Instant::now());
                        }
                    }
                    Err(_) => {}
                }
                UpstreamMessage::Text(text.to_owned())
            }
            Ok(Message::Binary(data)) => UpstreamMessage::Binary(data.to_vec()),
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(tunnel_id = %tunnel_id, "Pong received");
                continue;
            }
            Ok(Message::Ping(_)) => continue,
            Err(e) => {
                tracing::debug!(tunnel_id = %tunnel_id, error = %e, "Client receive error");
                break;
            }
        };

        if upstream_sink.send(forwarded).await.is_err() {
            tracing::debug!(tunnel_id = %tunnel_id, "Upstream sink closed");
            break;
        }
    }

    let _ = upstream_sink.send(UpstreamMessage::Close(None)).await;
    upstream_reader.abort();
    sweeper.abort();
    state.tunnels.remove(&tunnel_id).await;
    writer.abort();
    tracing::info!(tunnel_id = %tunnel_id, "Stream tunnel closed");
}
