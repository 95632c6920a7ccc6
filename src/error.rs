use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::distance::DistanceError;
use crate::models::request::UnknownTier;
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    UnknownTier(#[from] UnknownTier),

    #[error("cannot estimate price right now: {0}")]
    DistanceUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage unavailable: {0}")]
    Persistence(String),

    #[error("could not allocate a unique tracking code after {0} attempts")]
    CodeSpaceExhausted(u32),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(inner) => AppError::Validation(inner),
            StoreError::NotFound(code) => {
                AppError::NotFound(format!("no service request matches tracking code {code}"))
            }
            StoreError::CodeSpaceExhausted(attempts) => AppError::CodeSpaceExhausted(attempts),
            StoreError::Persistence(message) => AppError::Persistence(message),
        }
    }
}

impl From<DistanceError> for AppError {
    fn from(err: DistanceError) -> Self {
        match err {
            DistanceError::Unavailable(message) => AppError::DistanceUnavailable(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::UnknownTier(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DistanceUnavailable(_)
            | AppError::Persistence(_)
            | AppError::CodeSpaceExhausted(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "request failed");
        }

        let body = match &self {
            AppError::Validation(err) => Json(json!({
                "error": self.to_string(),
                "field": err.field,
            })),
            _ => Json(json!({
                "error": self.to_string()
            })),
        };

        (status, body).into_response()
    }
}
