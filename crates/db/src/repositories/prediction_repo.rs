//! Repository for the `prediction_histories` table.

use breedid_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::prediction::{CreatePredictionHistory, PredictionHistory};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, media_id, image_path, model_used, predicted_class, \
                       confidence, predictions, processed_media_path, is_correct, \
                       created_at, updated_at";

/// Provides access to a user's prediction history.
pub struct PredictionRepo;

impl PredictionRepo {
    /// Record a successful inference, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreatePredictionHistory,
    ) -> Result<PredictionHistory, sqlx::Error> {
        let query = format!(
            "INSERT INTO prediction_histories
                (user_id, media_id, image_path, model_used, predicted_class,
                 confidence, predictions, processed_media_path)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PredictionHistory>(&query)
            .bind(input.user_id)
            .bind(input.media_id)
            .bind(&input.image_path)
            .bind(&input.model_used)
            .bind(&input.predicted_class)
            .bind(input.confidence)
            .bind(Json(&input.predictions))
            .bind(&input.processed_media_path)
            .fetch_one(pool)
            .await
    }

    /// Find a live history row belonging to `user_id`.
    pub async fn find_for_user(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<PredictionHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prediction_histories
             WHERE id = $1 AND user_id = $2 AND is_deleted = false"
        );
        sqlx::query_as::<_, PredictionHistory>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Page of a user's live history, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PredictionHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM prediction_histories
             WHERE user_id = $1 AND is_deleted = false
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, PredictionHistory>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for_user(pool: &PgPool, user_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM prediction_histories WHERE user_id = $1 AND is_deleted = false",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Soft-delete a history row. Returns `true` if the row was updated.
    pub async fn soft_delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE prediction_histories SET is_deleted = true
             WHERE id = $1 AND user_id = $2 AND is_deleted = false",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
