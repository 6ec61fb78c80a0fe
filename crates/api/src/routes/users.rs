//! Route definitions for the `/users` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /      -> list_users (admin)
/// GET    /me    -> get_me
/// POST   /me    -> update_me
/// DELETE /me    -> delete_me
/// DELETE /{id}  -> delete_user (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users))
        .route(
            "/me",
            get(users::get_me)
                .post(users::update_me)
                .delete(users::delete_me),
        )
        .route("/{id}", delete(users::delete_user))
}
