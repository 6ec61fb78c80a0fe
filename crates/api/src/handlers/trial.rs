//! Handler for explicitly starting a trial.

use axum::Json;
use axum::extract::State;
use axum_extra::extract::cookie::CookieJar;

use crate::auth::trial_token;
use crate::error::AppResult;
use crate::middleware::device::DeviceInfo;
use crate::prediction::trial_gate;
use crate::response::StatusMessage;
use crate::state::AppState;

/// POST /api/trial/start
///
/// Issue (or re-issue) this device's trial and set the `trial_token` cookie.
/// Fails with 403 once the device's trial has been used.
pub async fn start_trial(
    State(state): State<AppState>,
    device: DeviceInfo,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<StatusMessage>)> {
    let issued = trial_gate::start(&state.pool, &state.config.jwt.secret, &device).await?;
    let jar = jar.add(trial_token::cookie(issued.token, state.config.secure_cookies));
    Ok((jar, Json(StatusMessage::new("Trial started."))))
}
