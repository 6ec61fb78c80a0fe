//! Handlers for the `/predictions` resource.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use breedid_core::detection::Detection;
use breedid_core::error::CoreError;
use breedid_core::types::{DbId, Timestamp};
use breedid_core::urls::public_url;
use breedid_db::models::prediction::PredictionHistory;
use breedid_db::repositories::PredictionRepo;
use serde::Serialize;

use crate::error::AppResult;
use crate::ingestion::read_upload;
use crate::middleware::auth::AuthUser;
use crate::middleware::device::DeviceInfo;
use crate::middleware::identity::ResolvedIdentity;
use crate::prediction::orchestrator;
use crate::query::{PageParams, DEFAULT_PAGE_LIMIT};
use crate::response::{DataResponse, MessageResponse, PaginatedResponse, Pagination};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Public view of a prediction. Stored paths are exposed only as URLs.
#[derive(Debug, Serialize)]
pub struct PredictionView {
    pub id: DbId,
    pub media_id: DbId,
    pub image_url: String,
    pub processed_media_url: Option<String>,
    pub model_used: String,
    pub predicted_class: String,
    pub confidence: f64,
    pub predictions: Vec<Detection>,
    pub is_correct: Option<bool>,
    pub created_at: Timestamp,
}

impl PredictionView {
    pub fn new(history: PredictionHistory, base_url: &str) -> Self {
        Self {
            id: history.id,
            media_id: history.media_id,
            image_url: public_url(base_url, &history.image_path),
            processed_media_url: history
                .processed_media_path
                .as_deref()
                .map(|p| public_url(base_url, p)),
            model_used: history.model_used,
            predicted_class: history.predicted_class,
            confidence: history.confidence,
            predictions: history.predictions.0,
            is_correct: history.is_correct,
            created_at: history.created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/predictions
///
/// Multipart with one `file` part. Open to users, trial holders and (under
/// the implicit trial flow) anonymous callers. An invalid trial cookie is
/// cleared on error responses too.
pub async fn create_prediction(
    State(state): State<AppState>,
    identity: ResolvedIdentity,
    device: DeviceInfo,
    mut multipart: Multipart,
) -> Response {
    let error_jar = identity.discarded_cookie.then(|| identity.jar.clone());

    match run_prediction(&state, identity, &device, &mut multipart).await {
        Ok(ok) => ok.into_response(),
        Err(e) => match error_jar {
            Some(jar) => (jar, e).into_response(),
            None => e.into_response(),
        },
    }
}

async fn run_prediction(
    state: &AppState,
    identity: ResolvedIdentity,
    device: &DeviceInfo,
    multipart: &mut Multipart,
) -> AppResult<(CookieJar, Json<MessageResponse<PredictionView>>)> {
    let mut form = read_upload(multipart, state.config.max_upload_bytes, 1).await?;
    let file = form.take_single_file()?;

    let outcome = orchestrator::predict(state, identity, device, file).await?;

    Ok((
        outcome.jar,
        Json(MessageResponse {
            message: "Prediction successful.".into(),
            data: PredictionView::new(outcome.history, &state.config.node_base_url),
        }),
    ))
}

/// GET /api/predictions
pub async fn list_predictions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<PageParams>,
) -> AppResult<Json<PaginatedResponse<PredictionView>>> {
    let (page, limit, offset) = params.resolve(DEFAULT_PAGE_LIMIT);
    let rows = PredictionRepo::list_for_user(&state.pool, auth.user_id, limit, offset).await?;
    let total = PredictionRepo::count_for_user(&state.pool, auth.user_id).await?;

    let base = &state.config.node_base_url;
    Ok(Json(PaginatedResponse {
        data: rows.into_iter().map(|h| PredictionView::new(h, base)).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /api/predictions/{id}
pub async fn get_prediction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PredictionView>>> {
    let history = PredictionRepo::find_for_user(&state.pool, id, auth.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Prediction",
            id,
        })?;
    Ok(Json(DataResponse {
        data: PredictionView::new(history, &state.config.node_base_url),
    }))
}

/// DELETE /api/predictions/{id}
pub async fn delete_prediction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !PredictionRepo::soft_delete(&state.pool, id, auth.user_id).await? {
        return Err(CoreError::NotFound {
            entity: "Prediction",
            id,
        }
        .into());
    }
    Ok(StatusCode::NO_CONTENT)
}
