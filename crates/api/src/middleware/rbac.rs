//! Admin gate for account management and physical media-folder browsing.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use breedid_core::error::CoreError;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// An authenticated caller holding the `admin` role.
///
/// Missing or invalid tokens reject with 401; other roles with 403.
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = AuthUser::from_request_parts(parts, state).await?;
        if caller.is_admin() {
            Ok(RequireAdmin(caller))
        } else {
            tracing::debug!(user_id = caller.user_id, role = %caller.role, "Admin route refused");
            Err(CoreError::Forbidden("Admin role required".into()).into())
        }
    }
}
