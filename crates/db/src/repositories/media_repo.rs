//! Repository for the `medias` table.

use breedid_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::media::{CreateMedia, ExpiredMedia, Media, MediaFilter, UpdateMedia};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, media_path, description, media_type, creator_id, \
                       directory_id, is_deleted, created_at, updated_at";

/// Shared `WHERE` clause for [`MediaRepo::list`] and [`MediaRepo::count`].
/// Every filter is optional: a `NULL` bind disables it.
const FILTER_CLAUSE: &str = "is_deleted = false
    AND ($1::BIGINT IS NULL OR creator_id = $1)
    AND ($2::BIGINT IS NULL OR directory_id = $2)
    AND ($3::TEXT IS NULL OR name ILIKE '%' || $3 || '%')
    AND ($4::TEXT IS NULL OR media_type LIKE $4 || '/%')
    AND ($5::TEXT IS NULL OR replace(media_path, '\\', '/') LIKE $5 || '%')
    AND ($6::TIMESTAMPTZ IS NULL OR created_at >= $6)
    AND ($7::TIMESTAMPTZ IS NULL OR created_at < $7)";

/// Provides CRUD and listing operations for media records.
pub struct MediaRepo;

impl MediaRepo {
    /// Insert a new media record, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateMedia) -> Result<Media, sqlx::Error> {
        let query = format!(
            "INSERT INTO medias (name, media_path, description, media_type, creator_id, directory_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(&input.name)
            .bind(&input.media_path)
            .bind(&input.description)
            .bind(&input.media_type)
            .bind(input.creator_id)
            .bind(input.directory_id)
            .fetch_one(pool)
            .await
    }

    /// Find a live media record by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Media>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM medias WHERE id = $1 AND is_deleted = false");
        sqlx::query_as::<_, Media>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a media record by ID, including soft-deleted ones.
    pub async fn find_any_by_id(pool: &PgPool, id: DbId) -> Result<Option<Media>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM medias WHERE id = $1");
        sqlx::query_as::<_, Media>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Filtered page of live media, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &MediaFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Media>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM medias
             WHERE {FILTER_CLAUSE}
             ORDER BY created_at DESC, id DESC
             LIMIT $8 OFFSET $9"
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(filter.creator_id)
            .bind(filter.directory_id)
            .bind(&filter.search)
            .bind(&filter.type_prefix)
            .bind(&filter.path_prefix)
            .bind(filter.created_from)
            .bind(filter.created_before)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Total number of live media matching `filter`.
    pub async fn count(pool: &PgPool, filter: &MediaFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM medias WHERE {FILTER_CLAUSE}");
        sqlx::query_scalar(&query)
            .bind(filter.creator_id)
            .bind(filter.directory_id)
            .bind(&filter.search)
            .bind(&filter.type_prefix)
            .bind(&filter.path_prefix)
            .bind(filter.created_from)
            .bind(filter.created_before)
            .fetch_one(pool)
            .await
    }

    /// Update name and/or description of a live record.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMedia,
    ) -> Result<Option<Media>, sqlx::Error> {
        let query = format!(
            "UPDATE medias SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1 AND is_deleted = false
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Media>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete a record. Returns `true` if the row was updated.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE medias SET is_deleted = true WHERE id = $1 AND is_deleted = false")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently remove a record. Returns `true` if a row was deleted.
    pub async fn hard_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM medias WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-deleted records whose last update is at or before `cutoff`.
    pub async fn list_expired_soft_deleted(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<ExpiredMedia>, sqlx::Error> {
        sqlx::query_as::<_, ExpiredMedia>(
            "SELECT id, media_path FROM medias
             WHERE is_deleted = true AND updated_at <= $1
             ORDER BY id ASC",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await
    }
}
