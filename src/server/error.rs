use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Error carrying an explicit HTTP status through the `anyhow::Error` chain.
#[derive(Debug, Error)]
#[error("{message}")]
struct StatusError {
    status: StatusCode,
    message: String,
}

/// Unified error type for HTTP responses.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    fn with_status(status: StatusCode, message: impl Into<String>) -> Self {
        Self(StatusError { status, message: message.into() }.into())
    }

    /// Construct a 403 Forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::FORBIDDEN, message)
    }

    /// Construct a 500 Internal Server Error with a specific message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if let Some(e) = self.0.downcast_ref::<StatusError>() {
            e.status
        } else {
            tracing::error!("Request failed: {:#}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let body = json!({ "error": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// Tests.
