//! User entity model and DTOs.

use breedid_core::roles::Role;
use breedid_core::types::{DbId, Timestamp};
use breedid_core::usage::UsageCounters;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Full user row from the `users` table.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub directory_id: Option<DbId>,
    pub is_deleted: bool,
    /// Set only on the shared account that owns anonymous trial uploads.
    pub is_guest: bool,
    pub photo_uploads_this_week: i32,
    pub video_uploads_this_week: i32,
    pub last_usage_reset_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    /// Typed role. Rows are constrained by `ck_users_role`, so an unknown
    /// value falls back to the most restrictive role.
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::User)
    }

    pub fn usage(&self) -> UsageCounters {
        UsageCounters {
            photo_uploads_this_week: self.photo_uploads_this_week,
            video_uploads_this_week: self.video_uploads_this_week,
            last_usage_reset_at: self.last_usage_reset_at,
        }
    }
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub directory_id: Option<DbId>,
    pub photo_uploads_this_week: i32,
    pub video_uploads_this_week: i32,
    pub last_usage_reset_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            directory_id: u.directory_id,
            photo_uploads_this_week: u.photo_uploads_this_week,
            video_uploads_this_week: u.video_uploads_this_week,
            last_usage_reset_at: u.last_usage_reset_at,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// DTO for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// DTO for a profile update. All fields are optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub password_hash: Option<String>,
}
