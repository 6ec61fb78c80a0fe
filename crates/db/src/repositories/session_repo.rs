//! Repository for the `refresh_sessions` table.

use breedid_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::{CreateRefreshSession, RefreshSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, jti, token_hash, used, expires_at, created_at";

/// Provides refresh-token rotation storage.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRefreshSession,
    ) -> Result<RefreshSession, sqlx::Error> {
        let query = format!(
            "INSERT INTO refresh_sessions (user_id, jti, token_hash, expires_at)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(input.user_id)
            .bind(&input.jti)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .fetch_one(pool)
            .await
    }

    /// Find a session by token ID, used or not.
    pub async fn find_by_jti(
        pool: &PgPool,
        jti: &str,
    ) -> Result<Option<RefreshSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM refresh_sessions WHERE jti = $1");
        sqlx::query_as::<_, RefreshSession>(&query)
            .bind(jti)
            .fetch_optional(pool)
            .await
    }

    /// Mark a session as rotated. Returns `false` if it was already used.
    pub async fn mark_used(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE refresh_sessions SET used = true WHERE id = $1 AND used = false")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a single session by token ID. Returns `true` if a row was deleted.
    pub async fn delete_by_jti(pool: &PgPool, jti: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE jti = $1")
            .bind(jti)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every session of a user. Returns the count removed.
    pub async fn delete_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
