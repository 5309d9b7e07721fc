use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Catalogue fetch error: {0}")]
    Fetch(String),

    #[error("State persistence error: {0}")]
    Persist(String),

    #[error("Event log replay error: {0}")]
    Replay(String),

    #[error("Recommendation computation exceeded its time budget")]
    BudgetExceeded,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Fetch(msg) | AppError::Persist(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Replay(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::BudgetExceeded => (StatusCode::GATEWAY_TIMEOUT, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
