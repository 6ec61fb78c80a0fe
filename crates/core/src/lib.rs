//! Domain logic for the breed identification backend.
//!
//! Everything in this crate is pure: no database, network, or filesystem
//! access. The `db` and `api` crates build on these types and rules.

pub mod detection;
pub mod error;
pub mod fingerprint;
pub mod media;
pub mod reclamation;
pub mod roles;
pub mod storage;
pub mod trial;
pub mod types;
pub mod urls;
pub mod usage;
