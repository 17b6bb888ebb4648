use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pagewise::StateVersion;
use pagewise::wire::Envelope;
use thiserror::Error;

/// Errors returned by the HTTP handlers, rendered as an error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("version conflict: expected {expected}, found {actual}")]
    Conflict {
        expected: StateVersion,
        actual: StateVersion,
    },

    /// The query string or body could not be parsed.
    #[error("malformed request: {0}")]
    Malformed(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } | Self::Malformed(_) => StatusCode::BAD_REQUEST,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn summary(&self) -> &'static str {
        match self {
            Self::Validation { .. } | Self::Malformed(_) => "Invalid request",
            Self::Conflict { .. } => "Version conflict",
            Self::Internal(_) => "Internal server error",
        }
    }
}

impl From<pagewise::Error> for ApiError {
    fn from(e: pagewise::Error) -> Self {
        match e {
            pagewise::Error::Validation { field, message } => Self::validation(field, message),
            pagewise::Error::Conflict { expected, actual } => Self::Conflict { expected, actual },
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Malformed(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(target: "pagewise_server", error = %self, "request failed");
        } else {
            tracing::debug!(target: "pagewise_server", error = %self, "request rejected");
        }
        let body = Envelope::<()>::failure(status.as_u16(), self.summary(), self.to_string());
        (status, Json(body)).into_response()
    }
}
