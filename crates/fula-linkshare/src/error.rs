//! Error types and HTTP mapping

use crate::render;
use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use fula_sharing::SharingError;
use fula_storage::StorageError;
use thiserror::Error;

/// API error type
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Sharing(#[from] SharingError),

    #[error("invalid request: {0}")]
    BadRequest(&'static str),

    #[error("requested range not satisfiable")]
    RangeNotSatisfiable { size: u64 },

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::Sharing(err.into())
    }
}

impl ApiError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Sharing(e) => match e {
                SharingError::BucketNotFound(_) | SharingError::ObjectNotFound { .. } => {
                    StatusCode::NOT_FOUND
                }
                SharingError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
                SharingError::Timeout => StatusCode::GATEWAY_TIMEOUT,
                e if e.is_client_error() => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed reason for a 400 body; request data is never echoed
    fn client_message(&self) -> &'static str {
        match self {
            Self::Sharing(e) => match e {
                SharingError::InvalidCredential => "invalid access",
                SharingError::NonPublicCredential => "non-public access key id",
                SharingError::UnsupportedCredentialVersion(_) => "invalid access version",
                SharingError::MissingCredential => "missing access",
                SharingError::MissingBucket => "missing bucket",
                SharingError::MalformedHost { .. } => "malformed host",
                _ => "bad request",
            },
            Self::BadRequest(message) => message,
            _ => "bad request",
        }
    }

    /// Message for the 404 page
    fn not_found_message(&self) -> &'static str {
        match self {
            Self::Sharing(SharingError::BucketNotFound(_)) => "Oops! Bucket not found.",
            _ => "Oops! Object not found.",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match status {
            StatusCode::NOT_FOUND => {
                let page = render::not_found_page(self.not_found_message());
                (status, Html(page)).into_response()
            }
            StatusCode::RANGE_NOT_SATISFIABLE => {
                let size = match &self {
                    Self::RangeNotSatisfiable { size } => *size,
                    _ => 0,
                };
                (
                    status,
                    [(header::CONTENT_RANGE, format!("bytes */{}", size))],
                    self.to_string(),
                )
                    .into_response()
            }
            StatusCode::GATEWAY_TIMEOUT => {
                tracing::warn!(error = %self, "Request deadline exceeded");
                (status, "request timed out").into_response()
            }
            s if s.is_server_error() => {
                // Details stay in the log.
                tracing::error!(error = %self, "Unable to handle request");
                (status, "unable to handle request").into_response()
            }
            s if s == StatusCode::BAD_REQUEST => {
                tracing::debug!(error = %self, "Rejected request");
                let message = format!("invalid request: {}", self.client_message());
                (status, message).into_response()
            }
            _ => (status, self.to_string()).into_response(),
        }
    }
}
