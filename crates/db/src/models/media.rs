//! Media records. `media_path` is the physical location relative to the
//! process working directory and is never serialized directly; handlers
//! translate it into a public URL.

use breedid_core::types::{DbId, Timestamp};
use serde::Deserialize;
use sqlx::FromRow;

/// A row from the `medias` table.
#[derive(Debug, Clone, FromRow)]
pub struct Media {
    pub id: DbId,
    pub name: String,
    pub media_path: String,
    pub description: Option<String>,
    pub media_type: Option<String>,
    pub creator_id: DbId,
    pub directory_id: Option<DbId>,
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a media record.
#[derive(Debug, Clone)]
pub struct CreateMedia {
    pub name: String,
    pub media_path: String,
    pub description: Option<String>,
    pub media_type: Option<String>,
    pub creator_id: DbId,
    pub directory_id: Option<DbId>,
}

/// DTO for renaming / describing a media record.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMedia {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Listing filter. `None` fields are not applied.
#[derive(Debug, Clone, Default)]
pub struct MediaFilter {
    pub creator_id: Option<DbId>,
    pub directory_id: Option<DbId>,
    /// Case-insensitive substring of `name`.
    pub search: Option<String>,
    /// MIME major type, e.g. `image`.
    pub type_prefix: Option<String>,
    /// Stored path prefix, e.g. `uploads/images/2025/03/`.
    pub path_prefix: Option<String>,
    pub created_from: Option<Timestamp>,
    pub created_before: Option<Timestamp>,
}

/// Minimal projection used by the reconciliation job.
#[derive(Debug, Clone, FromRow)]
pub struct ExpiredMedia {
    pub id: DbId,
    pub media_path: String,
}
