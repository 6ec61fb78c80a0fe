use axum::routing::get;
use axum::Router;

use crate::handlers::predictions;
use crate::state::AppState;

/// Routes mounted at `/predictions`.
///
/// ```text
/// GET    /      -> list_predictions
/// POST   /      -> create_prediction (user, trial guest or anonymous)
/// GET    /{id}  -> get_prediction
/// DELETE /{id}  -> delete_prediction
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(predictions::list_predictions).post(predictions::create_prediction),
        )
        .route(
            "/{id}",
            get(predictions::get_prediction).delete(predictions::delete_prediction),
        )
}
