//! Logical directory tree.

use breedid_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `directories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Directory {
    pub id: DbId,
    pub name: String,
    pub parent_id: Option<DbId>,
    pub creator_id: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a directory.
#[derive(Debug, Deserialize)]
pub struct CreateDirectory {
    pub name: String,
    pub parent_id: Option<DbId>,
    pub creator_id: DbId,
}
