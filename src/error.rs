use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::models::ErrorResponse;

/// Why a submitted body could not become a [`LogRecord`](crate::record::LogRecord).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("body is not valid JSON")]
    MalformedJson,
    #[error("body is not a JSON object")]
    NotAnObject,
    #[error("field `{0}` is missing or empty")]
    MissingField(&'static str),
    #[error("unknown level `{0}`")]
    UnknownLevel(String),
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to publish log entry to {}", .sinks.join(" and "))]
    Sinks { sinks: Vec<&'static str> },
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid log data: {0}")]
    InvalidLogData(#[from] ValidationError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::InvalidLogData(_) => {
                (StatusCode::BAD_REQUEST, "Invalid log data format".to_string())
            }
            ApiError::Dispatch(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
