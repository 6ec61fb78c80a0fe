use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::directories;
use crate::state::AppState;

/// Routes mounted at `/directories`.
///
/// ```text
/// POST   /                 -> create_directory
/// GET    /content          -> root_content
/// GET    /content/{id}     -> directory_content
/// DELETE /{id}             -> delete_directory
/// GET    /{id}/breadcrumb  -> breadcrumb
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(directories::create_directory))
        .route("/content", get(directories::root_content))
        .route("/content/{id}", get(directories::directory_content))
        .route("/{id}", delete(directories::delete_directory))
        .route("/{id}/breadcrumb", get(directories::breadcrumb))
}
