//! Handlers for the `/auth` resource (register, login, refresh, logout).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use breedid_core::error::CoreError;
use breedid_core::roles::Role;
use breedid_db::models::session::CreateRefreshSession;
use breedid_db::models::user::{CreateUser, User, UserResponse};
use breedid_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{
    generate_access_token, generate_refresh_token, hash_refresh_token, validate_refresh_token,
};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::extract::ValidJson;
use crate::prediction::orchestrator::GUEST_EMAIL;
use crate::response::{DataResponse, MessageResponse, StatusMessage};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "Username must be 1-50 characters"))]
    pub username: String,
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Email is invalid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request body for `POST /auth/refresh-token` and `POST /auth/logout`.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create a `user`-role account together with its root directory.
pub async fn register(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<MessageResponse<UserResponse>>)> {
    let email = input.email.trim().to_lowercase();

    if email == GUEST_EMAIL || UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(CoreError::Conflict("Email is already registered".into()).into());
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username: input.username.trim().to_string(),
            email,
            password_hash,
            role: Role::User,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Registration successful.".into(),
            data: user.into(),
        }),
    ))
}

/// POST /api/auth/login
///
/// Authenticate with email + password. Returns access and refresh tokens.
pub async fn login(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<LoginRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let invalid = || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, &input.email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(invalid());
    }

    let response = create_auth_response(&state, user).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/auth/refresh-token
///
/// Rotate a refresh token. Presenting a token that was already rotated (or
/// is unknown) revokes every session of its user.
pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<RefreshRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let invalid = || {
        AppError::Core(CoreError::Unauthorized(
            "Invalid or expired refresh token".into(),
        ))
    };

    let claims = validate_refresh_token(&input.refresh_token, &state.config.jwt)
        .map_err(|_| invalid())?;

    let session = SessionRepo::find_by_jti(&state.pool, &claims.jti).await?;
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = match session {
        Some(s) if !s.used && s.token_hash == token_hash => s,
        _ => {
            let revoked = SessionRepo::delete_all_for_user(&state.pool, claims.sub).await?;
            tracing::warn!(user_id = claims.sub, revoked, "Refresh token reuse detected");
            return Err(invalid());
        }
    };

    if !SessionRepo::mark_used(&state.pool, session.id).await? {
        let revoked = SessionRepo::delete_all_for_user(&state.pool, session.user_id).await?;
        tracing::warn!(user_id = session.user_id, revoked, "Concurrent refresh token reuse");
        return Err(invalid());
    }

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("User no longer exists".into())))?;

    let response = create_auth_response(&state, user).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/auth/logout
///
/// Revoke the session behind the given refresh token.
pub async fn logout(
    State(state): State<AppState>,
    ValidJson(input): ValidJson<RefreshRequest>,
) -> AppResult<Json<StatusMessage>> {
    let claims = validate_refresh_token(&input.refresh_token, &state.config.jwt).map_err(|_| {
        AppError::Core(CoreError::Unauthorized("Invalid refresh token".into()))
    })?;

    SessionRepo::delete_by_jti(&state.pool, &claims.jti).await?;
    tracing::info!(user_id = claims.sub, "User logged out");

    Ok(Json(StatusMessage::new("Logged out successfully.")))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Generate access + refresh tokens, persist a session row, and build the response.
async fn create_auth_response(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let access_token = generate_access_token(user.id, user.role().as_str(), &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let refresh = generate_refresh_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    SessionRepo::create(
        &state.pool,
        &CreateRefreshSession {
            user_id: user.id,
            jti: refresh.jti,
            token_hash: refresh.token_hash,
            expires_at: refresh.expires_at,
        },
    )
    .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token: refresh.token,
        expires_in: state.config.jwt.access_token_expiry_mins * 60,
        user: user.into(),
    })
}
