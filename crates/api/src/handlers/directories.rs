//! Handlers for the `/directories` resource (logical folder tree).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use breedid_core::error::CoreError;
use breedid_core::types::DbId;
use breedid_db::models::directory::{CreateDirectory, Directory};
use breedid_db::models::media::MediaFilter;
use breedid_db::repositories::{DirectoryRepo, MediaRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::medias::MediaView;
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Upper bound on media returned with a directory listing.
const CONTENT_MEDIA_LIMIT: i64 = 1000;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDirectoryRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
    /// Defaults to the caller's root directory.
    pub parent_id: Option<DbId>,
}

#[derive(Debug, Serialize)]
pub struct DirectoryContent {
    pub directory_id: Option<DbId>,
    pub directories: Vec<Directory>,
    pub medias: Vec<MediaView>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/directories
pub async fn create_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<CreateDirectoryRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Directory>>)> {
    let parent_id = match input.parent_id {
        Some(id) => find_owned(&state, &auth, id).await?.id,
        None => root_directory(&state, &auth)
            .await?
            .ok_or_else(|| AppError::BadRequest("Account has no root directory".into()))?,
    };

    let directory = DirectoryRepo::create(
        &state.pool,
        &CreateDirectory {
            name: input.name.trim().to_string(),
            parent_id: Some(parent_id),
            creator_id: auth.user_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: directory })))
}

/// GET /api/directories/content
pub async fn root_content(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<DirectoryContent>>> {
    let root = root_directory(&state, &auth).await?;
    let content = match root {
        Some(id) => load_content(&state, &auth, id).await?,
        None => DirectoryContent {
            directory_id: None,
            directories: Vec::new(),
            medias: Vec::new(),
        },
    };
    Ok(Json(DataResponse { data: content }))
}

/// GET /api/directories/content/{id}
pub async fn directory_content(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DirectoryContent>>> {
    find_owned(&state, &auth, id).await?;
    let content = load_content(&state, &auth, id).await?;
    Ok(Json(DataResponse { data: content }))
}

/// GET /api/directories/{id}/breadcrumb
///
/// Ancestry from the root down to and including `id`.
pub async fn breadcrumb(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<Directory>>>> {
    find_owned(&state, &auth, id).await?;
    let chain = DirectoryRepo::breadcrumb(&state.pool, id).await?;
    Ok(Json(DataResponse { data: chain }))
}

/// DELETE /api/directories/{id}
///
/// Soft-delete the directory, its descendants and every media inside them.
pub async fn delete_directory(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    find_owned(&state, &auth, id).await?;
    if root_directory(&state, &auth).await? == Some(id) {
        return Err(AppError::BadRequest(
            "The root directory cannot be deleted".into(),
        ));
    }

    let removed = DirectoryRepo::soft_delete_recursive(&state.pool, id).await?;
    tracing::info!(user_id = auth.user_id, directory_id = id, removed, "Directory tree deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_owned(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<Directory> {
    DirectoryRepo::find_owned(&state.pool, id, auth.user_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "Directory",
                id,
            }
            .into()
        })
}

async fn root_directory(state: &AppState, auth: &AuthUser) -> AppResult<Option<DbId>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        })?;
    Ok(user.directory_id)
}

async fn load_content(state: &AppState, auth: &AuthUser, id: DbId) -> AppResult<DirectoryContent> {
    let directories = DirectoryRepo::children(&state.pool, id).await?;
    let filter = MediaFilter {
        creator_id: Some(auth.user_id),
        directory_id: Some(id),
        ..Default::default()
    };
    let medias = MediaRepo::list(&state.pool, &filter, CONTENT_MEDIA_LIMIT, 0).await?;

    Ok(DirectoryContent {
        directory_id: Some(id),
        directories,
        medias: MediaView::many(medias, &state.config.node_base_url),
    })
}
