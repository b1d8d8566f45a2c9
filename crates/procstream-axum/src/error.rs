//! Axum-specific error types and mappings.
//!
//! Maps `StreamError` and `ProcessControlError` to HTTP status codes and a
//! JSON `{error, status}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use procstream_core::{ProcessControlError, StreamError};
use serde::Serialize;
use thiserror::Error;

/// Axum-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (invalid input).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The resource exists but is not in a usable state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The server may not read the resource.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Service unavailable (e.g., process supervisor down).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HttpError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::NotFound(msg)
            | Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Forbidden(msg)
            | Self::ServiceUnavailable(msg)
            | Self::Internal(msg) => msg,
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<StreamError> for HttpError {
    fn from(err: StreamError) -> Self {
        let message = err.to_string();
        match err {
            StreamError::ProcessNotFound(_) | StreamError::FileNotFound(_) => {
                Self::NotFound(message)
            }
            StreamError::LogPathUnavailable { .. } => Self::Conflict(message),
            StreamError::PermissionDenied(_) => Self::Forbidden(message),
            StreamError::SupervisorUnavailable(_) => Self::ServiceUnavailable(message),
            StreamError::TailerIo(_)
            | StreamError::UnknownConnection(_)
            | StreamError::QueueFull(_) => {
                Self::Internal(message)
            }
        }
    }
}

impl From<ProcessControlError> for HttpError {
    fn from(err: ProcessControlError) -> Self {
        StreamError::from(err).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use procstream_core::StreamKind;

    #[test]
    fn stream_errors_map_to_status_codes() {
        let cases = [
            (
                StreamError::ProcessNotFound("api".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                StreamError::FileNotFound("/var/log/api.log".into()),
                StatusCode::NOT_FOUND,
            ),
            (
                StreamError::LogPathUnavailable {
                    process: "api".into(),
                    stream: StreamKind::Error,
                },
                StatusCode::CONFLICT,
            ),
            (
                StreamError::PermissionDenied("/var/log/api.log".into()),
                StatusCode::FORBIDDEN,
            ),
            (
                StreamError::SupervisorUnavailable("pm2 down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                StreamError::TailerIo("EIO".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                StreamError::QueueFull("c1".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(HttpError::from(err).status(), expected);
        }
    }

    #[test]
    fn message_is_the_stream_error_text() {
        let err = HttpError::from(ProcessControlError::ProcessNotFound("ghost".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Not found: Process ghost not found");
    }
}
