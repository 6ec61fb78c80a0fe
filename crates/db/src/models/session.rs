//! Refresh-token sessions.

use breedid_core::types::{DbId, Timestamp};
use sqlx::FromRow;

/// A row from the `refresh_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshSession {
    pub id: DbId,
    pub user_id: DbId,
    pub jti: String,
    pub token_hash: String,
    pub used: bool,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// DTO for creating a session.
#[derive(Debug)]
pub struct CreateRefreshSession {
    pub user_id: DbId,
    pub jti: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
}
