//! Route definitions for the `/medias` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::medias;
use crate::state::AppState;

/// Routes mounted at `/medias`.
///
/// ```text
/// GET    /                  -> list_medias
/// POST   /upload/single     -> upload_single
/// POST   /upload/multiple   -> upload_multiple
/// POST   /upload-url        -> upload_url
/// GET    /{id}              -> get_media
/// POST   /{id}              -> update_media
/// DELETE /{id}              -> delete_media
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(medias::list_medias))
        .route("/upload/single", post(medias::upload_single))
        .route("/upload/multiple", post(medias::upload_multiple))
        .route("/upload-url", post(medias::upload_url))
        .route(
            "/{id}",
            get(medias::get_media)
                .post(medias::update_media)
                .delete(medias::delete_media),
        )
}
