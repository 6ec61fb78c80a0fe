//! Prediction history rows.

use breedid_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

use breedid_core::detection::Detection;

/// A row from the `prediction_histories` table.
#[derive(Debug, Clone, FromRow)]
pub struct PredictionHistory {
    pub id: DbId,
    pub user_id: DbId,
    pub media_id: DbId,
    pub image_path: String,
    pub model_used: String,
    pub predicted_class: String,
    pub confidence: f64,
    pub predictions: Json<Vec<Detection>>,
    pub processed_media_path: Option<String>,
    pub is_correct: Option<bool>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a successful inference.
#[derive(Debug, Clone)]
pub struct CreatePredictionHistory {
    pub user_id: DbId,
    pub media_id: DbId,
    pub image_path: String,
    pub model_used: String,
    pub predicted_class: String,
    pub confidence: f64,
    pub predictions: Vec<Detection>,
    pub processed_media_path: Option<String>,
}
