//! Transparent gateway to the inference service's real-time stream.
//!
//! WebSocket upgrades on `/predict/stream` and `/api/predict/stream` are
//! tunnelled to the upstream stream endpoint; plain HTTP requests on the
//! same paths are forwarded to the inference service's HTTP base.

mod handler;
mod heartbeat;
pub mod pending;
pub mod registry;

pub use handler::stream_proxy;
pub use heartbeat::start_heartbeat;
pub use registry::TunnelRegistry;
