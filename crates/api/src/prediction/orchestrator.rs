//! End-to-end prediction for one uploaded file.
//!
//! Order of effects: charge check, file write, media row, inference,
//! processed output, charge consumption, history row. Any failure up to and
//! including consumption removes the media row and the files written so far.

use axum_extra::extract::cookie::CookieJar;
use breedid_core::detection::headline;
use breedid_core::error::CoreError;
use breedid_core::media::MediaKind;
use breedid_core::storage::StorageScope;
use breedid_core::types::DbId;
use breedid_db::models::media::{CreateMedia, Media};
use breedid_db::models::prediction::{CreatePredictionHistory, PredictionHistory};
use breedid_db::models::user::User;
use breedid_db::repositories::{MediaRepo, PredictionRepo, UserRepo};
use breedid_inference::InferenceResponse;
use chrono::Utc;

use super::{ledger, trial_gate};
use crate::auth::{password, trial_token};
use crate::config::TrialFlow;
use crate::error::{AppError, AppResult};
use crate::ingestion::{self, UploadedFile};
use crate::middleware::device::DeviceInfo;
use crate::middleware::identity::{Identity, ResolvedIdentity};
use crate::state::AppState;
use crate::storage;

/// Account that owns every media and history row created through a trial.
pub const GUEST_EMAIL: &str = "guest@dogbreedid.com";
pub const GUEST_USERNAME: &str = "guest";

/// What a successful prediction is charged against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Charge {
    Quota { user_id: DbId },
    Trial { trial_id: DbId },
}

/// The caller after admission: the owning account, the charge and the
/// storage layout to use.
struct Admitted {
    owner: User,
    charge: Charge,
    scope: StorageScope,
    jar: CookieJar,
}

/// A completed prediction plus the cookie jar to send back.
#[derive(Debug)]
pub struct PredictionOutcome {
    pub history: PredictionHistory,
    pub jar: CookieJar,
}

/// Return the shared guest account, provisioning it on first use.
pub async fn guest_account(state: &AppState) -> AppResult<User> {
    let hash = password::unusable_password_hash()
        .map_err(|e| AppError::InternalError(format!("Failed to hash guest password: {e}")))?;
    match UserRepo::find_or_create_guest(&state.pool, GUEST_EMAIL, GUEST_USERNAME, &hash).await {
        Ok(guest) => Ok(guest),
        Err(sqlx::Error::RowNotFound) => Err(AppError::InternalError(format!(
            "{GUEST_EMAIL} is held by a regular account"
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Run one prediction for the resolved caller.
pub async fn predict(
    state: &AppState,
    resolved: ResolvedIdentity,
    device: &DeviceInfo,
    file: UploadedFile,
) -> AppResult<PredictionOutcome> {
    let kind = MediaKind::from_mime(&file.mime).ok_or_else(|| {
        AppError::BadRequest("Only images and videos can be used for prediction".into())
    })?;

    let Admitted {
        owner,
        charge,
        scope,
        jar,
    } = admit(state, resolved, device, kind).await?;

    let stored = ingestion::persist(&state.config, scope, &file, Utc::now()).await?;
    let media = match MediaRepo::create(
        &state.pool,
        &CreateMedia {
            name: file.original_name.clone(),
            media_path: stored.media_path.clone(),
            description: None,
            media_type: Some(file.mime.clone()),
            creator_id: owner.id,
            directory_id: owner.directory_id,
        },
    )
    .await
    {
        Ok(media) => media,
        Err(e) => {
            ingestion::discard(&state.config, &stored.media_path).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        media_id = media.id,
        owner_id = owner.id,
        kind = kind.as_str(),
        size = stored.size,
        "Forwarding media for prediction"
    );

    let response = match state
        .inference
        .predict(kind, file.bytes, &file.original_name, &file.mime)
        .await
    {
        Ok(response) => response,
        Err(e) => {
            compensate(state, &media, None).await;
            return Err(AppError::PredictionUnavailable(e.to_string()));
        }
    };

    let processed_path = match write_processed(state, kind, &response).await {
        Ok(path) => path,
        Err(e) => {
            compensate(state, &media, None).await;
            return Err(e);
        }
    };

    let consumed = match charge {
        Charge::Trial { trial_id } => trial_gate::consume(&state.pool, trial_id).await,
        Charge::Quota { user_id } => ledger::consume(&state.pool, user_id, kind).await,
    };
    if let Err(e) = consumed {
        compensate(state, &media, processed_path.as_deref()).await;
        return Err(e);
    }

    let (predicted_class, confidence) = headline(&response.predictions);
    let history = PredictionRepo::create(
        &state.pool,
        &CreatePredictionHistory {
            user_id: owner.id,
            media_id: media.id,
            image_path: media.media_path.clone(),
            model_used: state.config.model_name.clone(),
            predicted_class,
            confidence,
            predictions: response.predictions,
            processed_media_path: processed_path,
        },
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, media_id = media.id, ?charge, "History insert failed after charge");
        e
    })?;

    tracing::info!(
        history_id = history.id,
        predicted_class = %history.predicted_class,
        confidence = history.confidence,
        "Prediction recorded"
    );

    Ok(PredictionOutcome { history, jar })
}

/// Resolve the owner and charge for the caller, rejecting before any write.
async fn admit(
    state: &AppState,
    resolved: ResolvedIdentity,
    device: &DeviceInfo,
    kind: MediaKind,
) -> AppResult<Admitted> {
    let ResolvedIdentity { identity, jar, .. } = resolved;

    match identity {
        Identity::User(user) => {
            let owner = ledger::check(&state.pool, &state.config.quota, user.user_id, kind).await?;
            Ok(Admitted {
                charge: Charge::Quota { user_id: owner.id },
                owner,
                scope: StorageScope::Authenticated,
                jar,
            })
        }
        Identity::Trial { trial_id } => {
            trial_gate::admit(&state.pool, trial_id).await?;
            Ok(Admitted {
                owner: guest_account(state).await?,
                charge: Charge::Trial { trial_id },
                scope: StorageScope::Anonymous,
                jar,
            })
        }
        Identity::Anonymous => {
            if state.config.trial_flow == TrialFlow::Explicit {
                return Err(CoreError::Unauthorized(
                    "Start a free trial or sign in to make a prediction.".into(),
                )
                .into());
            }
            let issued = trial_gate::start(&state.pool, &state.config.jwt.secret, device).await?;
            let jar = jar.add(trial_token::cookie(issued.token, state.config.secure_cookies));
            Ok(Admitted {
                owner: guest_account(state).await?,
                charge: Charge::Trial {
                    trial_id: issued.trial.id,
                },
                scope: StorageScope::Anonymous,
                jar,
            })
        }
    }
}

/// Persist the annotated output, if the model returned one.
async fn write_processed(
    state: &AppState,
    kind: MediaKind,
    response: &InferenceResponse,
) -> AppResult<Option<String>> {
    let Some(processed) = &response.processed_media else {
        return Ok(None);
    };

    let bytes = processed
        .decode()
        .map_err(|e| AppError::PredictionUnavailable(e.to_string()))?;
    let extension = processed.safe_extension().ok_or_else(|| {
        AppError::PredictionUnavailable(format!(
            "Unusable processed media format {:?}",
            processed.format
        ))
    })?;

    let stored = storage::new_processed_path(kind == MediaKind::Video, &extension);
    let path = storage::fs_path_for(&state.config, &stored)
        .ok_or_else(|| AppError::InternalError(format!("Unmappable processed path {stored}")))?;
    storage::write_file(&path, &bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to write {}: {e}", path.display())))?;

    Ok(Some(stored))
}

/// Undo the media row and any files written for a failed prediction.
async fn compensate(state: &AppState, media: &Media, processed_path: Option<&str>) {
    if let Err(e) = MediaRepo::hard_delete(&state.pool, media.id).await {
        tracing::warn!(error = %e, media_id = media.id, "Failed to remove media row");
    }
    ingestion::discard(&state.config, &media.media_path).await;
    if let Some(path) = processed_path {
        ingestion::discard(&state.config, path).await;
    }
    tracing::info!(media_id = media.id, "Compensated failed prediction");
}
