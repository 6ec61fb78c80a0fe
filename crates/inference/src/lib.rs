//! Integration with the external breed inference service.
//!
//! - [`api`] wraps the HTTP prediction endpoints (`/predict`, `/predict/video`).
//! - [`messages`] defines the JSON frames exchanged on the real-time stream.
//! - [`client`] opens WebSocket connections to the upstream stream endpoint.

pub mod api;
pub mod client;
pub mod messages;

pub use api::{InferenceApi, InferenceError, InferenceResponse, ProcessedMedia};
pub use client::{UpstreamClient, UpstreamClientError, UpstreamStream};
