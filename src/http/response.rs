//! Error responses.
//!
//! Every failure on the public surface is turned into one JSON body of the
//! shape `{"error": true, "message": "..."}`. The status code depends on the
//! error kind; the not-found case is answered with 400, which clients of the
//! image route already rely on.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Message sent when the requested image file does not exist.
pub const FILE_NOT_FOUND: &str = "File could not be found";

/// Message sent for any other I/O failure. The real error is only logged.
pub const GENERIC_FAILURE: &str = "Something went wrong!";

/// JSON body returned on every failure path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: bool,
    pub message: String,
}

impl ErrorPayload {
    /// Error payload carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
        }
    }
}

/// Errors produced while answering a request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The resolved image file does not exist.
    #[error("{}", FILE_NOT_FOUND)]
    NotFound,

    /// Any other I/O failure before the first body byte was committed.
    #[error("I/O error: {0}")]
    Io(std::io::Error),

    /// The request could not be turned into a file path.
    #[error("{0}")]
    InvalidRequest(String),

    /// Rejected by the CORS gate before reaching the image route.
    #[error("Method {method} not allowed")]
    MethodNotAllowed { method: Method, allowed: HeaderValue },

    /// No route matched.
    #[error("Not found")]
    RouteNotFound,
}

impl ApiError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RouteNotFound => StatusCode::NOT_FOUND,
        }
    }

    /// Label used for the `outcome` dimension of request metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            ApiError::NotFound => "not_found",
            ApiError::Io(_) => "io_error",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::MethodNotAllowed { .. } => "method_not_allowed",
            ApiError::RouteNotFound => "no_route",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Io(_) => GENERIC_FAILURE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => ApiError::NotFound,
            _ => ApiError::Io(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Io(e) = &self {
            tracing::error!(error = %e, kind = ?e.kind(), "Image read failed");
        }

        let status = self.status_code();
        let body = Json(ErrorPayload::new(self.message()));

        match self {
            ApiError::MethodNotAllowed { allowed, .. } => {
                (status, [(header::ALLOW, allowed)], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
