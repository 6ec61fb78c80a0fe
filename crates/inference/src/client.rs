//! WebSocket client for the upstream inference stream.
//!
//! [`UpstreamClient`] holds the stream endpoint; [`UpstreamClient::connect`]
//! opens one tunnel leg per accepted client socket.

use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// A live WebSocket connection to the inference service.
pub type UpstreamStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Configuration handle for the upstream stream endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    ws_url: String,
}

impl UpstreamClient {
    /// * `ws_url` - full WebSocket URL, e.g. `ws://host:8000/predict/stream`.
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
        }
    }

    /// Derive the stream URL from the HTTP base of the inference service.
    pub fn from_http_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        let ws_base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        Self::new(format!("{ws_base}/predict/stream"))
    }

    pub fn ws_url(&self) -> &str {
        &self.ws_url
    }

    /// Target URL for a client request, carrying over its query string.
    pub fn target_url(&self, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}?{q}", self.ws_url),
            _ => self.ws_url.clone(),
        }
    }

    /// Open a new upstream connection.
    pub async fn connect(&self, query: Option<&str>) -> Result<UpstreamStream, UpstreamClientError> {
        let url = self.target_url(query);
        let (ws_stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
            UpstreamClientError::Connection(format!("Failed to connect to {}: {e}", self.ws_url))
        })?;

        tracing::debug!(url = %url, "Connected to inference stream");
        Ok(ws_stream)
    }
}

/// Errors that can occur when working with the upstream stream.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamClientError {
    /// Failed to establish the initial WebSocket connection.
    #[error("Connection error: {0}")]
    Connection(String),
}
