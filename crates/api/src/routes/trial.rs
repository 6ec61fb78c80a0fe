use axum::routing::post;
use axum::Router;

use crate::handlers::trial;
use crate::state::AppState;

/// Routes mounted at `/trial`.
///
/// ```text
/// POST /start  -> start_trial
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/start", post(trial::start_trial))
}
