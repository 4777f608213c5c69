//! JSON error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;
use crate::chat::ChatFailure;

/// Errors returned by API handlers
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// The completion or speech endpoint failed
    Upstream(String),
    NotConfigured(&'static str),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    const fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_error"),
            Self::NotConfigured(_) => (StatusCode::SERVICE_UNAVAILABLE, "not_configured"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    fn into_message(self) -> String {
        match self {
            Self::NotFound(m) | Self::BadRequest(m) | Self::Upstream(m) | Self::Internal(m) => m,
            Self::NotConfigured(m) => m.to_string(),
        }
    }

    /// Map a crate error, keeping `message` as the user-facing text
    fn classify(error: &Error, message: String) -> Self {
        match error {
            Error::SessionNotFound(_) | Error::MessageNotFound(_) => Self::NotFound(message),
            Error::NoDocument | Error::EmptyPrompt => Self::BadRequest(message),
            Error::Completion(_) | Error::Tts(_) | Error::Http(_) => Self::Upstream(message),
            _ => Self::Internal(message),
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let message = error.to_string();
        Self::classify(&error, message)
    }
}

impl From<ChatFailure> for ApiError {
    fn from(failure: ChatFailure) -> Self {
        let message = failure.to_string();
        Self::classify(&failure.error, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let message = self.into_message();
        if status.is_server_error() {
            tracing::warn!(%status, code, message = %message, "request failed");
        }

        (
            status,
            Json(ErrorResponse {
                error: ErrorBody { code, message },
            }),
        )
            .into_response()
    }
}
