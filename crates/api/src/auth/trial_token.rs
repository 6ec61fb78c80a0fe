//! Signed trial tokens and the `trial_token` cookie.
//!
//! The token is an HS256 JWT `{trial_id, typ: "trial", exp, iat}` signed
//! with the access-token secret. The `typ` claim keeps an access token from
//! being replayed as a trial token and vice versa.

use axum_extra::extract::cookie::{Cookie, SameSite};
use breedid_core::trial::{TRIAL_COOKIE_NAME, TRIAL_RETENTION_DAYS};
use breedid_core::types::DbId;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

const TRIAL_TOKEN_TYPE: &str = "trial";

/// Lifetime of both the token and its cookie.
const TRIAL_MAX_AGE: std::time::Duration =
    std::time::Duration::from_secs(TRIAL_RETENTION_DAYS as u64 * 24 * 3600);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialClaims {
    pub trial_id: DbId,
    pub typ: String,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TrialTokenError {
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("not a trial token")]
    WrongType,
}

pub fn issue(trial_id: DbId, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = TrialClaims {
        trial_id,
        typ: TRIAL_TOKEN_TYPE.into(),
        exp: now + TRIAL_MAX_AGE.as_secs() as i64,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify(token: &str, secret: &str) -> Result<TrialClaims, TrialTokenError> {
    let data = decode::<TrialClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    if data.claims.typ != TRIAL_TOKEN_TYPE {
        return Err(TrialTokenError::WrongType);
    }
    Ok(data.claims)
}

/// Cookie carrying a trial token: HttpOnly, SameSite=Strict, 7-day Max-Age.
pub fn cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((TRIAL_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(TRIAL_MAX_AGE.try_into().unwrap_or_default())
        .build()
}

/// Cookie that clears a previously set trial token.
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((TRIAL_COOKIE_NAME, "")).path("/").build()
}
