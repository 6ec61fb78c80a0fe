//! Request extractors for authentication, authorization and caller identity.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`identity::ResolvedIdentity`] -- User, trial holder, or anonymous; never rejects.
//! - [`device::DeviceInfo`] -- Fingerprint and client IP used to key trials.

pub mod auth;
pub mod device;
pub mod identity;
pub mod rbac;
