use std::sync::Arc;
use std::time::Duration;

use super::registry::TunnelRegistry;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that pings every tunnelled client periodically.
///
/// Runs until aborted through the returned handle.
pub fn start_heartbeat(tunnels: Arc<TunnelRegistry>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let count = tunnels.tunnel_count().await;
            tracing::debug!(count, "Stream tunnel heartbeat ping");
            tunnels.ping_all().await;
        }
    })
}
