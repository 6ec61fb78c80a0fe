//! One-time trial for unauthenticated callers.
//!
//! Trials are keyed by device (fingerprint or IP) and carried in a signed
//! cookie. A trial is consumed by a conditional update, so at most one
//! prediction ever succeeds against it.

use breedid_core::error::CoreError;
use breedid_core::trial::{expiry_cutoff, TrialState, TRIAL_USED_MESSAGE};
use breedid_core::types::DbId;
use breedid_db::models::trial_guest::TrialGuest;
use breedid_db::repositories::TrialGuestRepo;
use chrono::Utc;
use sqlx::PgPool;

use crate::auth::trial_token;
use crate::error::{AppError, AppResult};
use crate::middleware::device::DeviceInfo;

/// A live trial plus a freshly signed token for it.
#[derive(Debug)]
pub struct IssuedTrial {
    pub trial: TrialGuest,
    pub token: String,
}

/// Issue a trial for this device, or re-issue the token of its live trial.
///
/// A device whose live trial is already used is refused.
pub async fn start(pool: &PgPool, secret: &str, device: &DeviceInfo) -> AppResult<IssuedTrial> {
    let ip = device.ip.as_deref().ok_or_else(|| {
        AppError::Core(CoreError::Unauthorized(
            "Could not identify IP address.".into(),
        ))
    })?;

    let live_after = expiry_cutoff(Utc::now());
    let trial = match TrialGuestRepo::find_live_for_device(pool, &device.fingerprint, ip, live_after)
        .await?
    {
        Some(existing) => {
            existing.state().issue()?;
            existing
        }
        None => {
            TrialState::Unissued.issue()?;
            let created = TrialGuestRepo::create(pool, &device.fingerprint, ip).await?;
            tracing::info!(trial_id = created.id, ip, "Trial issued");
            created
        }
    };

    let token = trial_token::issue(trial.id, secret)
        .map_err(|e| AppError::InternalError(format!("Failed to sign trial token: {e}")))?;

    Ok(IssuedTrial { trial, token })
}

/// Check that a cookie-bearing caller may still predict.
pub async fn admit(pool: &PgPool, trial_id: DbId) -> AppResult<TrialGuest> {
    let trial = TrialGuestRepo::find_live_by_id(pool, trial_id, expiry_cutoff(Utc::now()))
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Trial has expired. Please sign in to continue.".into(),
            ))
        })?;

    if trial.state() == TrialState::Used {
        return Err(CoreError::Forbidden(TRIAL_USED_MESSAGE.into()).into());
    }
    Ok(trial)
}

/// Mark the trial used. Fails if another request consumed it first.
pub async fn consume(pool: &PgPool, trial_id: DbId) -> AppResult<()> {
    if TrialGuestRepo::mark_used(pool, trial_id).await? {
        tracing::info!(trial_id, "Trial consumed");
        Ok(())
    } else {
        Err(CoreError::Forbidden(TRIAL_USED_MESSAGE.into()).into())
    }
}
