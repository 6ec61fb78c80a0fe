//! Tests for `TunnelRegistry`.
//!
//! These exercise the registry directly, without performing any WebSocket
//! upgrades: add/remove bookkeeping, heartbeat pings and shutdown.

use axum::extract::ws::Message;
use breedid_api::proxy::TunnelRegistry;

#[tokio::test]
async fn new_registry_is_empty() {
    let registry = TunnelRegistry::new();
    assert_eq!(registry.tunnel_count().await, 0);
}

#[tokio::test]
async fn add_and_remove_track_count() {
    let registry = TunnelRegistry::new();

    let _a = registry.add("t-1".to_string()).await;
    let _b = registry.add("t-2".to_string()).await;
    assert_eq!(registry.tunnel_count().await, 2);

    registry.remove("t-1").await;
    registry.remove("unknown").await;
    assert_eq!(registry.tunnel_count().await, 1);
}

#[tokio::test]
async fn sender_reaches_tunnel_receiver() {
    let registry = TunnelRegistry::new();
    let (tx, mut rx) = registry.add("t-1".to_string()).await;

    tx.send(Message::Text(r#"{"type":"pong"}"#.into())).unwrap();

    match rx.recv().await {
        Some(Message::Text(text)) => assert_eq!(text.as_str(), r#"{"type":"pong"}"#),
        other => panic!("Expected text frame, got {other:?}"),
    }
}

#[tokio::test]
async fn ping_all_reaches_every_tunnel() {
    let registry = TunnelRegistry::new();
    let (_tx1, mut rx1) = registry.add("t-1".to_string()).await;
    let (_tx2, mut rx2) = registry.add("t-2".to_string()).await;

    registry.ping_all().await;

    assert!(matches!(rx1.recv().await, Some(Message::Ping(_))));
    assert!(matches!(rx2.recv().await, Some(Message::Ping(_))));
}

#[tokio::test]
async fn shutdown_all_sends_close_and_clears() {
    let registry = TunnelRegistry::new();
    let (_tx1, mut rx1) = registry.add("t-1".to_string()).await;
    let (_tx2, mut rx2) = registry.add("t-2".to_string()).await;

    registry.shutdown_all().await;

    assert_eq!(registry.tunnel_count().await, 0);
    assert!(matches!(rx1.recv().await, Some(Message::Close(None))));
    assert!(matches!(rx2.recv().await, Some(Message::Close(None))));
}
