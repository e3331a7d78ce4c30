use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use tracing::error;
use thiserror::Error;

use crate::client::dto::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} is already in progress")]
    Busy(&'static str),

    /// The service answered `success: false`, optionally with a message.
    #[error("{}", .0.as_deref().unwrap_or("Scheduling service reported a failure"))]
    Rejected(Option<String>),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found")]
    NotFound,
}

impl AppError {
    /// Failures that never reached a well-formed service answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Http(_) | AppError::Decode(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::BadRequest(msg) | AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Busy(what) => (StatusCode::CONFLICT, format!("{} is already in progress", what)),
            AppError::Rejected(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                msg.unwrap_or_else(|| "Request rejected".to_string()),
            ),
            e @ (AppError::Http(_) | AppError::Decode(_)) => {
                error!("upstream error: {}", e);
                (StatusCode::BAD_GATEWAY, "Upstream scheduling service unavailable".to_string())
            }
            AppError::Config(msg) => {
                error!("configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(ApiResponse::<()>::failure(error_message));

        (status, body).into_response()
    }
}
