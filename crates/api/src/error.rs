use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use breedid_core::error::CoreError;
use serde::Serialize;

/// Public message for any failed inference call. Downstream error text is
/// logged, never returned.
pub const PREDICTION_UNAVAILABLE: &str =
    "Prediction is unavailable right now. Please try again later.";

const GENERIC_INTERNAL: &str = "An internal error occurred";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Every variant renders the same `{success: false, errors: [...]}` envelope.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `breedid_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request contract violations, one entry per offending field.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),

    /// The inference call failed. Carries the downstream detail for logs.
    #[error("Prediction failed: {0}")]
    PredictionUnavailable(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// Error envelope shared by every non-2xx JSON response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub errors: Vec<ErrorItem>,
}

#[derive(Debug, Serialize)]
pub struct ErrorItem {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorItem {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, errors) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => {
                let (status, message) = match core {
                    CoreError::NotFound { entity, id } => {
                        (StatusCode::NOT_FOUND, format!("{entity} with id {id} not found"))
                    }
                    CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                    CoreError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                    CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
                    CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
                    CoreError::TooManyRequests(msg) => {
                        (StatusCode::TOO_MANY_REQUESTS, msg.clone())
                    }
                    CoreError::Internal(msg) => {
                        tracing::error!(error = %msg, "Internal core error");
                        (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_INTERNAL.to_string())
                    }
                };
                (status, vec![ErrorItem::message(message)])
            }

            // --- Database errors ---
            AppError::Database(err) => {
                let (status, message) = classify_sqlx_error(err);
                (status, vec![ErrorItem::message(message)])
            }

            // --- Request contract ---
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, validation_items(errors)),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, vec![ErrorItem::message(msg)]),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![ErrorItem::message(GENERIC_INTERNAL)],
                )
            }
            AppError::PredictionUnavailable(detail) => {
                tracing::error!(error = %detail, "Inference call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    vec![ErrorItem::message(PREDICTION_UNAVAILABLE)],
                )
            }
        };

        let body = ErrorBody {
            success: false,
            errors,
        };
        (status, axum::Json(body)).into_response()
    }
}

/// Flatten validator output into envelope items, sorted by field name.
fn validation_items(errors: &validator::ValidationErrors) -> Vec<ErrorItem> {
    let mut items: Vec<ErrorItem> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter().map(move |e| ErrorItem {
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid")),
                field: Some(field.clone()),
            })
        })
        .collect();
    items.sort_by(|a, b| a.field.cmp(&b.field));
    items
}

/// Classify a sqlx error into an HTTP status and message.
///
/// - `RowNotFound` maps to 404.
/// - Unique constraint violations (constraint name starting with `uq_`) map to 409.
/// - Everything else maps to 500 with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, String) {
    match err {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint == "uq_users_email" {
                    return (StatusCode::CONFLICT, "Email is already registered".to_string());
                }
                if constraint.starts_with("uq_") {
                    return (
                        StatusCode::CONFLICT,
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
            }
            tracing::error!(error = %db_err, "Database error");
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_INTERNAL.to_string())
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_INTERNAL.to_string())
        }
    }
}
