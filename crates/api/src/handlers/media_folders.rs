//! Admin browsing of the physical upload layout `{bucket}/{YYYY}/{MM}`.

use std::io;
use std::path::Path as FsPath;

use axum::extract::{Path, Query, State};
use axum::Json;
use breedid_core::media::MEDIA_BUCKETS;
use breedid_db::models::media::MediaFilter;
use breedid_db::repositories::MediaRepo;
use serde::Deserialize;

use super::medias::MediaView;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PageParams;
use crate::response::{DataResponse, PaginatedResponse, Pagination};
use crate::state::AppState;
use crate::storage::UPLOADS_PREFIX;

const FOLDER_PAGE_LIMIT: i64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct FolderMediaParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

/// GET /api/admin/media-folders
pub async fn list_type_folders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let mut names = subdirectories(&state.config.upload_root, |name| {
        MEDIA_BUCKETS.contains(&name)
    })
    .await?;
    names.sort();
    Ok(Json(DataResponse { data: names }))
}

/// GET /api/admin/media-folders/{type}
///
/// Year folders, newest first.
pub async fn list_year_folders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(bucket): Path<String>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    check_bucket(&bucket)?;
    let dir = state.config.upload_root.join(&bucket);
    let mut years = subdirectories(&dir, is_year).await?;
    years.sort_by(|a, b| b.cmp(a));
    Ok(Json(DataResponse { data: years }))
}

/// GET /api/admin/media-folders/{type}/{year}
///
/// Month folders (`01`..`12`), newest first.
pub async fn list_month_folders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((bucket, year)): Path<(String, String)>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    check_bucket(&bucket)?;
    check_year(&year)?;
    let dir = state.config.upload_root.join(&bucket).join(&year);
    let mut months = subdirectories(&dir, is_month).await?;
    months.sort_by(|a, b| b.cmp(a));
    Ok(Json(DataResponse { data: months }))
}

/// GET /api/admin/media-folders/{type}/{year}/{month}
///
/// Live media stored under the folder, from every user.
pub async fn list_folder_media(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((bucket, year, month)): Path<(String, String, String)>,
    Query(params): Query<FolderMediaParams>,
) -> AppResult<Json<PaginatedResponse<MediaView>>> {
    check_bucket(&bucket)?;
    check_year(&year)?;
    if !is_month(&month) {
        return Err(AppError::BadRequest(format!("Invalid month folder: {month}")));
    }

    let (page, limit, offset) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(FOLDER_PAGE_LIMIT);

    let filter = MediaFilter {
        path_prefix: Some(format!("{UPLOADS_PREFIX}/{bucket}/{year}/{month}/")),
        search: params.search.filter(|s| !s.trim().is_empty()),
        ..Default::default()
    };
    let medias = MediaRepo::list(&state.pool, &filter, limit, offset).await?;
    let total = MediaRepo::count(&state.pool, &filter).await?;

    Ok(Json(PaginatedResponse {
        data: MediaView::many(medias, &state.config.node_base_url),
        pagination: Pagination::new(page, limit, total),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn check_bucket(bucket: &str) -> AppResult<()> {
    if MEDIA_BUCKETS.contains(&bucket) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Unknown media folder type: {bucket}")))
    }
}

fn check_year(year: &str) -> AppResult<()> {
    if is_year(year) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid year folder: {year}")))
    }
}

fn is_year(name: &str) -> bool {
    name.len() == 4 && name.chars().all(|c| c.is_ascii_digit())
}

fn is_month(name: &str) -> bool {
    name.len() == 2 && matches!(name.parse::<u8>(), Ok(1..=12))
}

/// Names of the subdirectories of `dir` accepted by `keep`. A missing
/// directory has no subdirectories.
async fn subdirectories(dir: &FsPath, keep: impl Fn(&str) -> bool) -> AppResult<Vec<String>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(read_error(dir, e)),
    };

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| read_error(dir, e))? {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
            if keep(name) {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

fn read_error(dir: &FsPath, e: io::Error) -> AppError {
    AppError::InternalError(format!("Failed to read {}: {e}", dir.display()))
}
