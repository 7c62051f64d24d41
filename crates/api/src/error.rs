//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saga::{ErrorKind, SagaError};

/// API-level error type that maps to plain-text HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// A saga operation failed; the status code follows the error kind.
    Saga(SagaError),
}

impl ApiError {
    /// Returns the status code this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Saga(err) => match err.kind() {
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::InvalidState => StatusCode::CONFLICT,
                ErrorKind::Infrastructure => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Saga(err) => match err.kind() {
                ErrorKind::Validation => format!("Invalid request body: {err}"),
                ErrorKind::InvalidState => {
                    tracing::warn!(error = %err, "request conflicts with order state");
                    err.to_string()
                }
                ErrorKind::Infrastructure => {
                    tracing::error!(error = %err, "request failed");
                    err.to_string()
                }
            },
        };

        (status, message).into_response()
    }
}

impl From<SagaError> for ApiError {
    fn from(err: SagaError) -> Self {
        ApiError::Saga(err)
    }
}
