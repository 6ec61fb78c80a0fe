use axum::routing::get;
use axum::Router;

use crate::handlers::media_folders;
use crate::state::AppState;

/// Routes mounted at `/admin/media-folders`. All require the admin role.
///
/// ```text
/// GET /                         -> list_type_folders
/// GET /{type}                   -> list_year_folders
/// GET /{type}/{year}            -> list_month_folders
/// GET /{type}/{year}/{month}    -> list_folder_media
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(media_folders::list_type_folders))
        .route("/{bucket}", get(media_folders::list_year_folders))
        .route("/{bucket}/{year}", get(media_folders::list_month_folders))
        .route(
            "/{bucket}/{year}/{month}",
            get(media_folders::list_folder_media),
        )
}
