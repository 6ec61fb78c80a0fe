//! Authentication and authorization primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- access/refresh JWT generation, validation, and digests.
//! - [`trial_token`] -- signed trial tokens and the cookie that carries them.

pub mod jwt;
pub mod password;
pub mod trial_token;
