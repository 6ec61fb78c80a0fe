//! Repository for the `directories` table.

use breedid_core::types::DbId;
use sqlx::PgPool;

use crate::models::directory::{CreateDirectory, Directory};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, parent_id, creator_id, created_at, updated_at";

/// Provides tree operations over a user's directories.
pub struct DirectoryRepo;

impl DirectoryRepo {
    /// Insert a new directory, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDirectory,
    ) -> Result<Directory, sqlx::Error> {
        let query = format!(
            "INSERT INTO directories (name, parent_id, creator_id)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Directory>(&query)
            .bind(&input.name)
            .bind(input.parent_id)
            .bind(input.creator_id)
            .fetch_one(pool)
            .await
    }

    /// Find a live directory owned by `creator_id`.
    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        creator_id: DbId,
    ) -> Result<Option<Directory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM directories
             WHERE id = $1 AND creator_id = $2 AND is_deleted = false"
        );
        sqlx::query_as::<_, Directory>(&query)
            .bind(id)
            .bind(creator_id)
            .fetch_optional(pool)
            .await
    }

    /// Live child directories of `parent_id`, by name.
    pub async fn children(pool: &PgPool, parent_id: DbId) -> Result<Vec<Directory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM directories
             WHERE parent_id = $1 AND is_deleted = false
             ORDER BY name ASC, id ASC"
        );
        sqlx::query_as::<_, Directory>(&query)
            .bind(parent_id)
            .fetch_all(pool)
            .await
    }

    /// Ancestors of `id` from the root down to `id` itself.
    pub async fn breadcrumb(pool: &PgPool, id: DbId) -> Result<Vec<Directory>, sqlx::Error> {
        let query = format!(
            "WITH RECURSIVE chain AS (
                SELECT {COLUMNS}, 0 AS depth FROM directories WHERE id = $1
                UNION ALL
                SELECT d.id, d.name, d.parent_id, d.creator_id, d.created_at, d.updated_at,
                       chain.depth + 1
                FROM directories d
                JOIN chain ON d.id = chain.parent_id
             )
             SELECT {COLUMNS} FROM chain ORDER BY depth DESC"
        );
        sqlx::query_as::<_, Directory>(&query)
            .bind(id)
            .fetch_all(pool)
            .await
    }

    /// Soft-delete a directory, all of its descendants and every media
    /// record inside them. Returns the number of directories affected.
    pub async fn soft_delete_recursive(pool: &PgPool, id: DbId) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let ids: Vec<DbId> = sqlx::query_scalar(
            "WITH RECURSIVE subtree AS (
                SELECT id FROM directories WHERE id = $1 AND is_deleted = false
                UNION ALL
                SELECT d.id FROM directories d
                JOIN subtree ON d.parent_id = subtree.id
                WHERE d.is_deleted = false
             )
             SELECT id FROM subtree",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        if ids.is_empty() {
            return Ok(0);
        }

        sqlx::query("UPDATE medias SET is_deleted = true WHERE directory_id = ANY($1) AND is_deleted = false")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("UPDATE directories SET is_deleted = true WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }
}
