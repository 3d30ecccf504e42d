use crate::orchestration::{IngestionError, QueryError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Boundary error. Client-class variants carry the message shown to callers;
/// everything else is reported as an internal error with details attached.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Insufficient data")]
    InsufficientData,
    #[error("{0} required")]
    MissingParameter(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid endpoint")]
    NotFound,
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
    #[error("{0}")]
    Arithmetic(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InsufficientData | AppError::MissingParameter(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Persistence(_) | AppError::Upstream(_) | AppError::Arithmetic(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<QueryError> for AppError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::InsufficientData { .. } => AppError::InsufficientData,
            QueryError::MissingParameter(name) => AppError::MissingParameter(capitalize(name)),
            QueryError::Upstream(e) => AppError::Upstream(e.to_string()),
            QueryError::Store(e) => AppError::Persistence(e.to_string()),
            QueryError::Engine(e) => AppError::Arithmetic(e.to_string()),
        }
    }
}

impl From<IngestionError> for AppError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::Upstream(e) => AppError::Upstream(e.to_string()),
            IngestionError::Store(e) => AppError::Persistence(e.to_string()),
            IngestionError::Engine(e) => AppError::Arithmetic(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            error!(error = %self, "Request failed");
            json!({
                "error": "Internal server error",
                "details": self.to_string(),
            })
        } else {
            json!({ "error": self.to_string() })
        };

        (status, Json(body)).into_response()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
