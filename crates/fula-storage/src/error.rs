//! Error types for the fula-storage crate

use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while talking to the storage network
#[derive(Error, Debug)]
pub enum StorageError {
    /// The serialized access could not be parsed
    #[error("invalid access: {0}")]
    InvalidAccess(String),

    /// Bucket not found
    #[error("bucket not found: {0}")]
    BucketNotFound(String),

    /// Object not found
    #[error("object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    /// Requested byte range lies outside the object
    #[error("invalid range: offset {offset} exceeds object size {size}")]
    InvalidRange { offset: u64, size: u64 },

    /// The project handle was already closed
    #[error("project already closed")]
    ProjectClosed,

    /// Any other backend failure
    #[error("backend error: {0}")]
    Backend(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Whether this error means the requested bucket or object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BucketNotFound(_) | Self::ObjectNotFound { .. })
    }
}
