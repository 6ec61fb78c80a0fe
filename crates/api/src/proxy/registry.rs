use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use breedid_core::types::Timestamp;
use tokio::sync::{mpsc, RwLock};

/// Channel sender half for pushing messages to a client socket.
pub type TunnelSender = mpsc::UnboundedSender<Message>;

/// One open client socket and its upstream leg.
pub struct Tunnel {
    /// Outbound messages to the client socket.
    pub sender: TunnelSender,
    pub opened_at: Timestamp,
}

/// Owns every live tunnel.
///
/// Thread-safe via interior `RwLock`; designed to be wrapped in `Arc` and
/// shared across the application.
pub struct TunnelRegistry {
    tunnels: RwLock<HashMap<String, Tunnel>>,
}

impl TunnelRegistry {
    pub fn new() -> Self {
        Self {
            tunnels: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tunnel.
    ///
    /// Returns a sender for messages bound to the client plus the receiver
    /// the tunnel's writer task drains into the client socket.
    pub async fn add(&self, tunnel_id: String) -> (TunnelSender, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let tunnel = Tunnel {
            sender: tx.clone(),
            opened_at: chrono::Utc::now(),
        };
        self.tunnels.write().await.insert(tunnel_id, tunnel);
        (tx, rx)
    }

    pub async fn remove(&self, tunnel_id: &str) {
        if let Some(tunnel) = self.tunnels.write().await.remove(tunnel_id) {
            let open_for = chrono::Utc::now() - tunnel.opened_at;
            tracing::debug!(tunnel_id, open_secs = open_for.num_seconds(), "Tunnel removed");
        }
    }

    pub async fn tunnel_count(&self) -> usize {
        self.tunnels.read().await.len()
    }

    /// Send a Close frame to every client, then forget all tunnels.
    pub async fn shutdown_all(&self) {
        let mut tunnels = self.tunnels.write().await;
        let count = tunnels.len();
        for tunnel in tunnels.values() {
            let _ = tunnel.sender.send(Message::Close(None));
        }
        tunnels.clear();
        tracing::info!(count, "Closed all stream tunnels");
    }

    /// Send a Ping frame to every client.
    pub async fn ping_all(&self) {
        let tunnels = self.tunnels.read().await;
        for tunnel in tunnels.values() {
            let _ = tunnel.sender.send(Message::Ping(Bytes::new()));
        }
    }
}

impl Default for TunnelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
