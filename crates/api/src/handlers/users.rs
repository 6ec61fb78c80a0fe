//! Handlers for the `/users` resource: own profile and admin management.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use breedid_core::error::CoreError;
use breedid_core::media::MediaKind;
use breedid_core::types::DbId;
use breedid_core::usage::{needs_reset, remaining, UsageCounters};
use breedid_db::models::user::{UpdateUser, User, UserResponse};
use breedid_db::repositories::{SessionRepo, UserRepo};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::{PageParams, DEFAULT_PAGE_LIMIT};
use crate::response::{DataResponse, MessageResponse, PaginatedResponse, Pagination};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// Remaining weekly uses; `None` means unlimited.
#[derive(Debug, Serialize)]
pub struct UsageSummary {
    pub photo_remaining: Option<i32>,
    pub video_remaining: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub usage: UsageSummary,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/users/me
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<ProfileResponse>>> {
    let user = find_user(&state, auth.user_id).await?;
    let usage = usage_summary(&state, &user);
    Ok(Json(DataResponse {
        data: ProfileResponse {
            user: user.into(),
            usage,
        },
    }))
}

/// POST /api/users/me
///
/// Change username and/or password. Omitted fields are left unchanged.
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(input): ValidJson<UpdateProfileRequest>,
) -> AppResult<Json<MessageResponse<UserResponse>>> {
    let password_hash = input
        .password
        .as_deref()
        .map(hash_password)
        .transpose()
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let update = UpdateUser {
        username: input.username.map(|u| u.trim().to_string()),
        password_hash,
    };

    let user = UserRepo::update(&state.pool, auth.user_id, &update)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        })?;

    Ok(Json(MessageResponse {
        message: "Profile updated.".into(),
        data: user.into(),
    }))
}

/// DELETE /api/users/me
///
/// Soft-delete the caller's account and revoke all refresh sessions.
pub async fn delete_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<StatusCode> {
    deactivate(&state, auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, "Account deleted by owner");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users, GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<PageParams>,
) -> AppResult<Json<PaginatedResponse<UserResponse>>> {
    let (page, limit, offset) = params.resolve(DEFAULT_PAGE_LIMIT);
    let users = UserRepo::list(&state.pool, limit, offset).await?;
    let total = UserRepo::count(&state.pool).await?;

    Ok(Json(PaginatedResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
        pagination: Pagination::new(page, limit, total),
    }))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if id == admin.user_id {
        return Err(AppError::BadRequest(
            "Use DELETE /api/users/me to delete your own account".into(),
        ));
    }
    deactivate(&state, id).await?;
    tracing::info!(admin_id = admin.user_id, user_id = id, "User deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::NotFound { entity: "User", id }.into())
}

async fn deactivate(state: &AppState, id: DbId) -> AppResult<()> {
    if !UserRepo::soft_delete(&state.pool, id).await? {
        return Err(CoreError::NotFound { entity: "User", id }.into());
    }
    SessionRepo::delete_all_for_user(&state.pool, id).await?;
    Ok(())
}

/// Remaining quota as the next prediction would see it, without persisting
/// a pending weekly reset.
fn usage_summary(state: &AppState, user: &User) -> UsageSummary {
    let now = Utc::now();
    let counters = if needs_reset(user.last_usage_reset_at, now) {
        UsageCounters {
            photo_uploads_this_week: 0,
            video_uploads_this_week: 0,
            last_usage_reset_at: now,
        }
    } else {
        user.usage()
    };
    let role = user.role();
    UsageSummary {
        photo_remaining: remaining(role, &counters, MediaKind::Photo, &state.config.quota),
        video_remaining: remaining(role, &counters, MediaKind::Video, &state.config.quota),
    }
}
