//! Error types for the fula-sharing crate

use crate::authservice::AuthServiceError;
use crate::dns::DnsError;
use fula_storage::StorageError;
use thiserror::Error;

/// Result type alias using `SharingError`
pub type Result<T> = std::result::Result<T, SharingError>;

/// Errors that can occur while routing a link sharing request
#[derive(Error, Debug)]
pub enum SharingError {
    /// The credential is not valid base58check or not a parseable grant
    #[error("invalid access")]
    InvalidCredential,

    /// The access key id resolved to a grant that is not public
    #[error("non-public access key id")]
    NonPublicCredential,

    /// The credential carries an unknown version byte
    #[error("invalid access version: {0}")]
    UnsupportedCredentialVersion(u8),

    /// The request path has no credential segment
    #[error("missing access")]
    MissingCredential,

    /// The request path has no bucket segment
    #[error("missing bucket")]
    MissingBucket,

    /// The Host header could not be split into host and port
    #[error("malformed host {host:?}: {reason}")]
    MalformedHost { host: String, reason: String },

    /// TXT lookup for a custom domain failed
    #[error("dns resolution failed: {0}")]
    DnsResolutionFailed(#[from] DnsError),

    /// The custom domain has no usable link sharing TXT records
    #[error("custom domain not configured: {0}")]
    CustomDomainNotConfigured(String),

    /// Only GET and HEAD are served on the base host
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Bucket not found
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// Object not found
    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    /// The auth service could not resolve an access key id
    #[error("auth service error: {0}")]
    AuthService(#[from] AuthServiceError),

    /// The request did not finish before its deadline
    #[error("request timed out")]
    Timeout,

    /// Invalid gateway configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Storage or other unclassified failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl SharingError {
    /// Whether the failure was caused by the request itself
    ///
    /// Client errors are answered with a generic 4xx message. Everything
    /// else is logged in full and answered with a 5xx.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredential
                | Self::NonPublicCredential
                | Self::UnsupportedCredentialVersion(_)
                | Self::MissingCredential
                | Self::MissingBucket
                | Self::MalformedHost { .. }
                | Self::MethodNotAllowed(_)
                | Self::BucketNotFound(_)
                | Self::ObjectNotFound { .. }
        )
    }
}

impl From<StorageError> for SharingError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::BucketNotFound(bucket) => Self::BucketNotFound(bucket),
            StorageError::ObjectNotFound { bucket, key } => Self::ObjectNotFound { bucket, key },
            StorageError::InvalidAccess(_) => Self::InvalidCredential,
            other => Self::Internal(other.to_string()),
        }
    }
}
