//! Breed identification API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes,
//! prediction pipeline, stream proxy) so integration tests and the binary
//! entrypoint can both access them.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod ingestion;
pub mod middleware;
pub mod prediction;
pub mod proxy;
pub mod query;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod storage;
