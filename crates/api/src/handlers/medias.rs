//! Handlers for the `/medias` resource: uploads and the media library.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use breedid_core::error::CoreError;
use breedid_core::media::MAX_BATCH_FILES;
use breedid_core::storage::StorageScope;
use breedid_core::types::{DbId, Timestamp};
use breedid_core::urls::public_url;
use breedid_db::models::media::{CreateMedia, Media, MediaFilter, UpdateMedia};
use breedid_db::repositories::{DirectoryRepo, MediaRepo, UserRepo};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::ingestion::{self, read_upload, StoredFile, UploadForm};
use crate::middleware::auth::AuthUser;
use crate::query::{PageParams, DEFAULT_PAGE_LIMIT};
use crate::response::{DataResponse, PaginatedResponse, Pagination};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Public view of a media row. The stored path is only exposed as a URL.
#[derive(Debug, Serialize)]
pub struct MediaView {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub media_type: Option<String>,
    pub media_url: String,
    pub creator_id: DbId,
    pub directory_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MediaView {
    pub fn new(media: Media, base_url: &str) -> Self {
        Self {
            id: media.id,
            media_url: public_url(base_url, &media.media_path),
            name: media.name,
            description: media.description,
            media_type: media.media_type,
            creator_id: media.creator_id,
            directory_id: media.directory_id,
            created_at: media.created_at,
            updated_at: media.updated_at,
        }
    }

    pub fn many(medias: Vec<Media>, base_url: &str) -> Vec<Self> {
        medias.into_iter().map(|m| Self::new(m, base_url)).collect()
    }
}

#[derive(Debug, Serialize)]
pub struct MediaUrlResponse {
    pub media_url: String,
}

/// Query parameters for `GET /api/medias`.
#[derive(Debug, Default, Deserialize)]
pub struct MediaListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    /// MIME major type, e.g. `image` or `video`.
    #[serde(rename = "type")]
    pub media_type: Option<String>,
    pub directory_id: Option<DbId>,
    /// Inclusive, `YYYY-MM-DD`.
    pub start_date: Option<NaiveDate>,
    /// Inclusive, `YYYY-MM-DD`.
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMediaRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/medias/upload/single
///
/// Multipart `file` plus `name`, optional `description` and `directory_id`.
pub async fn upload_single(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<MediaView>>)> {
    let mut form = read_upload(&mut multipart, state.config.max_upload_bytes, 1).await?;
    let file = form.take_single_file()?;
    let name = form
        .field("name")
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("Field 'name' is required".into()))?;
    let description = form.field("description").map(str::to_string);
    let directory_id = target_directory(&state, &auth, &form).await?;

    let stored = ingestion::persist(&state.config, StorageScope::Authenticated, &file, Utc::now())
        .await?;
    let media = insert_media(&state, &auth, stored, name, description, directory_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: MediaView::new(media, &state.config.node_base_url),
        }),
    ))
}

/// POST /api/medias/upload/multiple
///
/// Up to ten `files` parts. Optional repeated `names` / `descriptions`
/// fields must match the file count when present.
pub async fn upload_multiple(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<MediaView>>>)> {
    let mut form =
        read_upload(&mut multipart, state.config.max_upload_bytes, MAX_BATCH_FILES).await?;
    let files = form.take_files()?;

    let names = per_file_values(&form, "names", files.len())?;
    let descriptions = per_file_values(&form, "descriptions", files.len())?;
    let directory_id = target_directory(&state, &auth, &form).await?;

    let now = Utc::now();
    let mut stored = Vec::with_capacity(files.len());
    for file in &files {
        match ingestion::persist(&state.config, StorageScope::Authenticated, file, now).await {
            Ok(s) => stored.push(s),
            Err(e) => {
                for s in &stored {
                    ingestion::discard(&state.config, &s.media_path).await;
                }
                return Err(e);
            }
        }
    }

    let mut created = Vec::with_capacity(stored.len());
    let mut pending = stored.into_iter().enumerate();
    while let Some((i, file)) = pending.next() {
        let name = names
            .as_ref()
            .map(|n| n[i].clone())
            .unwrap_or_else(|| file.original_name.clone());
        let description = descriptions.as_ref().map(|d| d[i].clone());

        match insert_media(&state, &auth, file, name, description, directory_id).await {
            Ok(media) => created.push(media),
            Err(e) => {
                for media in &created {
                    if let Err(e) = MediaRepo::hard_delete(&state.pool, media.id).await {
                        tracing::warn!(error = %e, media_id = media.id, "Failed to roll back batch media row");
                    }
                    ingestion::discard(&state.config, &media.media_path).await;
                }
                for (_, rest) in pending.by_ref() {
                    ingestion::discard(&state.config, &rest.media_path).await;
                }
                return Err(e);
            }
        }
    }

    tracing::info!(user_id = auth.user_id, count = created.len(), "Batch upload stored");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: MediaView::many(created, &state.config.node_base_url),
        }),
    ))
}

/// POST /api/medias/upload-url
///
/// Store a single file and return only its public URL.
pub async fn upload_url(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<MediaUrlResponse>)> {
    let mut form = read_upload(&mut multipart, state.config.max_upload_bytes, 1).await?;
    let file = form.take_single_file()?;
    let name = form
        .field("name")
        .map(str::to_string)
        .unwrap_or_else(|| file.original_name.clone());
    let description = form.field("description").map(str::to_string);
    let directory_id = target_directory(&state, &auth, &form).await?;

    let stored = ingestion::persist(&state.config, StorageScope::Authenticated, &file, Utc::now())
        .await?;
    let media = insert_media(&state, &auth, stored, name, description, directory_id).await?;

    Ok((
        StatusCode::CREATED,
        Json(MediaUrlResponse {
            media_url: public_url(&state.config.node_base_url, &media.media_path),
        }),
    ))
}

/// GET /api/medias
///
/// Non-admins only see their own media.
pub async fn list_medias(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<MediaListParams>,
) -> AppResult<Json<PaginatedResponse<MediaView>>> {
    let (page, limit, offset) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_LIMIT);
    let filter = build_filter(&auth, &params)?;

    let medias = MediaRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = MediaRepo::count(&state.pool, &filter).await?;

    Ok(Json(PaginatedResponse {
        data: MediaView::many(medias, &state.config.node_base_url),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// GET /api/medias/{id}
pub async fn get_media(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MediaView>>> {
    let media = find_visible(&state, &auth, id).await?;
    Ok(Json(DataResponse {
        data: MediaView::new(media, &state.config.node_base_url),
    }))
}

/// POST /api/medias/{id}
///
/// Rename and/or re-describe a media item.
pub async fn update_media(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    ValidJson(input): ValidJson<UpdateMediaRequest>,
) -> AppResult<Json<DataResponse<MediaView>>> {
    find_visible(&state, &auth, id).await?;

    let update = UpdateMedia {
        name: input.name.map(|n| n.trim().to_string()),
        description: input.description,
    };
    let media = MediaRepo::update(&state.pool, id, &update)
        .await?
        .ok_or(CoreError::NotFound { entity: "Media", id })?;

    Ok(Json(DataResponse {
        data: MediaView::new(media, &state.config.node_base_url),
    }))
}

/// DELETE /api/medias/{id}
///
/// Soft delete. The file stays on disk until the cleanup job purges it.
pub async fn delete_media(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_visible(&state, &auth, id).await?;
    if !MediaRepo::soft_delete(&state.pool, id).await? {
        return Err(CoreError::NotFound { entity: "Media", id }.into());
    }
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A live media row the caller may see: their own, or any for admins.
/// Other users' media read as not found.
async fn find_visible(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Media> {
    MediaRepo::find_by_id(&state.pool, id)
        .await?
        .filter(|m| auth.is_admin() || m.creator_id == auth.user_id)
        .ok_or_else(|| CoreError::NotFound { entity: "Media", id }.into())
}

/// Directory named by the `directory_id` field (must be the caller's), or
/// the caller's root directory.
async fn target_directory(
    state: &AppState,
    auth: &AuthUser,
    form: &UploadForm,
) -> AppResult<Option<DbId>> {
    if let Some(raw) = form.field("directory_id") {
        let id: DbId = raw
            .trim()
            .parse()
            .map_err(|_| AppError::BadRequest("directory_id must be an integer".into()))?;
        DirectoryRepo::find_owned(&state.pool, id, auth.user_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Directory",
                id,
            })?;
        return Ok(Some(id));
    }

    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        })?;
    Ok(user.directory_id)
}

/// Values of a repeated field, which must line up with the uploaded files.
fn per_file_values(form: &UploadForm, name: &str, count: usize) -> AppResult<Option<Vec<String>>> {
    let values = form.values(name);
    if values.is_empty() {
        return Ok(None);
    }
    if values.len() != count {
        return Err(AppError::BadRequest(format!(
            "{name} has {} entries but {count} files were uploaded",
            values.len()
        )));
    }
    Ok(Some(values.into_iter().map(str::to_string).collect()))
}

/// Insert the row for a stored file, removing the file if the insert fails.
async fn insert_media(
    state: &AppState,
    auth: &AuthUser,
    stored: StoredFile,
    name: String,
    description: Option<String>,
    directory_id: Option<DbId>,
) -> AppResult<Media> {
    let input = CreateMedia {
        name,
        media_path: stored.media_path,
        description,
        media_type: Some(stored.mime),
        creator_id: auth.user_id,
        directory_id,
    };
    match MediaRepo::create(&state.pool, &input).await {
        Ok(media) => Ok(media),
        Err(e) => {
            ingestion::discard(&state.config, &input.media_path).await;
            Err(e.into())
        }
    }
}

fn build_filter(auth: &AuthUser, params: &MediaListParams) -> AppResult<MediaFilter> {
    let type_prefix = match params.media_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(t) if t.chars().all(|c| c.is_ascii_lowercase()) => Some(t.to_string()),
        Some(t) => return Err(AppError::BadRequest(format!("Invalid media type filter: {t}"))),
    };

    if let (Some(start), Some(end)) = (params.start_date, params.end_date) {
        if start > end {
            return Err(AppError::BadRequest(
                "start_date must not be after end_date".into(),
            ));
        }
    }

    Ok(MediaFilter {
        creator_id: (!auth.is_admin()).then_some(auth.user_id),
        directory_id: params.directory_id,
        search: params
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        type_prefix,
        path_prefix: None,
        created_from: params.start_date.map(start_of_day),
        created_before: params
            .end_date
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .map(start_of_day),
    })
}

fn start_of_day(date: NaiveDate) -> Timestamp {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}
