pub mod auth;
pub mod directories;
pub mod health;
pub mod media_folders;
pub mod medias;
pub mod predictions;
pub mod proxy;
pub mod trial;
pub mod users;

use axum::routing::get;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /predict/stream                                  stream proxy (WS upgrade or HTTP)
///
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/refresh-token                              rotate refresh token (public)
/// /auth/logout                                     revoke refresh token (public)
///
/// /trial/start                                     issue trial cookie (POST)
///
/// /predictions                                     list (auth), create (any identity)
/// /predictions/{id}                                get, delete
///
/// /users                                           list (admin only)
/// /users/me                                        get, update (POST), delete
/// /users/{id}                                      delete (admin only)
/// /admin/users                                     list (admin only)
///
/// /medias                                          list (GET)
/// /medias/upload/single                            upload one file with metadata (POST)
/// /medias/upload/multiple                          upload up to 10 files (POST)
/// /medias/upload-url                               upload and return URL (POST)
/// /medias/{id}                                     get, update (POST), delete
///
/// /directories                                     create (POST)
/// /directories/content                             root directory content (GET)
/// /directories/content/{id}                        directory content (GET)
/// /directories/{id}                                delete (recursive)
/// /directories/{id}/breadcrumb                     ancestry (GET)
///
/// /admin/media-folders                             type buckets (admin only)
/// /admin/media-folders/{type}                      years
/// /admin/media-folders/{type}/{year}               months
/// /admin/media-folders/{type}/{year}/{month}       stored media (paginated)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Real-time stream proxy.
        .merge(proxy::router())
        // Accounts.
        .nest("/auth", auth::router())
        .nest("/trial", trial::router())
        .nest("/users", users::router())
        .route("/admin/users", get(handlers::users::list_users))
        // Predictions.
        .nest("/predictions", predictions::router())
        // Media library.
        .nest("/medias", medias::router())
        .nest("/directories", directories::router())
        // Physical folder browsing.
        .nest("/admin/media-folders", media_folders::router())
}
