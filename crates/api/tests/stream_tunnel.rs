//! WebSocket tunnel between a client and a mock upstream detection stream.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use breedid_api::router::build_proxy_router;
use breedid_inference::messages::request_id_of;
use common::{spawn_mock, TestApp};
use futures::{SinkExt, StreamExt};
use sqlx::PgPool;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Seen = Arc<Mutex<Vec<String>>>;

// ---------------------------------------------------------------------------
// Mock upstream
// ---------------------------------------------------------------------------

/// Records every text frame; answers request ids starting with `answer`.
async fn upstream_ws(ws: WebSocketUpgrade, State(seen): State<Seen>) -> Response {
    ws.on_upgrade(move |socket| serve_upstream(socket, seen))
}

async fn serve_upstream(mut socket: WebSocket, seen: Seen) {
    while let Some(Ok(msg)) = socket.recv().await {
        let Message::Text(text) = msg else {
            continue;
        };
        seen.lock().await.push(text.as_str().to_owned());

        let Some(id) = request_id_of(text.as_str()) else {
            continue;
        };
        if id.starts_with("answer") {
            let reply = serde_json::json!({
                "type": "detections",
                "requestId": id,
                "predictions": [{"class": "pug", "confidence": 0.7}]
            });
            if socket.send(Message::Text(reply.to_string().into())).await.is_err() {
                break;
            }
        }
    }
}

/// Start a mock upstream and a gateway pointed at it. Returns the gateway's
/// stream URL and the upstream's record of received frames.
async fn tunnel_pair(pool: PgPool) -> (TestApp, String, Seen) {
    let seen: Seen = Arc::default();
    let upstream = spawn_mock(
        Router::new()
            .route("/predict/stream", get(upstream_ws))
            .with_state(Arc::clone(&seen)),
    )
    .await;
    let ws_url = format!("{}/predict/stream", upstream.replacen("http://", "ws://", 1));

    let app = TestApp::build(pool, move |config| config.py_ws_url = ws_url);
    let gateway = spawn_mock(build_proxy_router(app.state.clone())).await;
    let stream_url = format!("{}/api/predict/stream", gateway.replacen("http://", "ws://", 1));
    (app, stream_url, seen)
}

async fn next_message(client: &mut Client) -> WsMessage {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(10), client.next())
            .await
            .expect("frame should arrive in time")
            .expect("stream should stay open")
            .expect("frame should be valid");
        if !matches!(msg, WsMessage::Ping(_) | WsMessage::Pong(_)) {
            return msg;
        }
    }
}

async fn next_json(client: &mut Client) -> serde_json::Value {
    match next_message(client).await {
        WsMessage::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

fn frame(request_id: &str) -> WsMessage {
    WsMessage::Text(
        serde_json::json!({
            "type": "frame",
            "image": "data:image/jpeg;base64,AAAA",
            "meta": {"requestId": request_id}
        })
        .to_string(),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ping_is_answered_locally_and_frames_pass_through(pool: PgPool) {
    let (app, url, seen) = tunnel_pair(pool).await;
    let (mut client, _) = connect_async(url.as_str()).await.unwrap();

    client
        .send(WsMessage::Text(r#"{"type":"ping"}"#.to_string()))
        .await
        .unwrap();
    let pong = next_json(&mut client).await;
    assert_eq!(pong, serde_json::json!({"type": "pong"}));

    client.send(frame("answer-1")).await.unwrap();
    let reply = next_json(&mut client).await;
    assert_eq!(reply["type"], "detections");
    assert_eq!(reply["requestId"], "answer-1");
    assert_eq!(reply["predictions"][0]["class"], "pug");

    // Frames reach the upstream in order, so a forwarded ping would be first.
    let seen = seen.lock().await.clone();
    assert_eq!(seen.len(), 1, "{seen:?}");
    assert_eq!(request_id_of(&seen[0]).as_deref(), Some("answer-1"));

    assert_eq!(app.state.tunnels.tunnel_count().await, 1);
    client.close(None).await.unwrap();
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unanswered_request_is_reported_after_ttl(pool: PgPool) {
    let (_app, url, _seen) = tunnel_pair(pool).await;
    let (mut client, _) = connect_async(url.as_str()).await.unwrap();

    client.send(frame("silent-1")).await.unwrap();

    let report = next_json(&mut client).await;
    assert_eq!(report["type"], "error");
    assert_eq!(report["requestId"], "silent-1");
    assert!(report["message"].as_str().unwrap().contains("timed out"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_unreachable_upstream_closes_client_with_1011(pool: PgPool) {
    let app = TestApp::build(pool, |config| {
        config.py_ws_url = "ws://127.0.0.1:9/predict/stream".to_string();
    });
    let gateway = spawn_mock(build_proxy_router(app.state.clone())).await;
    let url = format!("{}/predict/stream", gateway.replacen("http://", "ws://", 1));

    let (mut client, _) = connect_async(url.as_str()).await.unwrap();

    match next_message(&mut client).await {
        WsMessage::Close(Some(close)) => {
            assert_eq!(close.code, CloseCode::Error);
            assert_eq!(u16::from(close.code), 1011);
            assert_eq!(close.reason, "Upstream unavailable");
        }
        other => panic!("expected a close frame, got {other:?}"),
    }
    assert_eq!(app.state.tunnels.tunnel_count().await, 0);
}
