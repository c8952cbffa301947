//! # Fula Storage
//!
//! Storage boundary used by the Fula link sharing gateway.
//!
//! This crate provides:
//! - **Access grants**: Parsing and base58check encoding of serialized access
//! - **Projects**: Stat, list, and ranged download of objects in a bucket
//! - **Memory backend**: An in-memory storage network for tests and development
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        Link Sharing Router              │
//! ├─────────────────────────────────────────┤
//! │    ObjectStorage  →  Project            │
//! ├─────────────────────┬───────────────────┤
//! │   MemoryStorage     │  (network SDK)    │
//! └─────────────────────┴───────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use fula_storage::{AccessGrant, MemoryStorage, ObjectStorage};
//!
//! let storage = MemoryStorage::new();
//! storage.put_object("demo", "photos", "cat.jpg", data)?;
//! let project = storage.open_project(&AccessGrant::new("demo")).await?;
//! let info = project.stat_object("photos", "cat.jpg").await?;
//! ```

pub mod access;
pub mod error;
pub mod memory;

pub use access::{check_decode, check_encode, AccessGrant, ACCESS_GRANT_VERSION, ACCESS_KEY_ID_VERSION};
pub use error::{Result, StorageError};
pub use memory::MemoryStorage;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// A lazy stream of listing entries
pub type ListStream = Pin<Box<dyn Stream<Item = Result<ListItem>> + Send>>;

/// System metadata of a stored object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,
    /// Content length in bytes
    pub size: u64,
    /// Creation time
    pub created: DateTime<Utc>,
    /// Content type recorded at upload, if any
    pub content_type: Option<String>,
    /// Entity tag
    pub etag: String,
}

/// One entry of a non-recursive listing
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListItem {
    /// Full key (objects) or full prefix ending in `/` (prefixes)
    pub key: String,
    /// Whether this entry is a collapsed prefix
    pub is_prefix: bool,
    /// Content length, zero for prefixes
    pub size: u64,
}

/// Entry point to the storage network
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Parse a serialized access grant
    fn parse_access(&self, serialized: &str) -> Result<AccessGrant> {
        AccessGrant::parse(serialized)
    }

    /// Open the project an access grant is scoped to
    async fn open_project(&self, access: &AccessGrant) -> Result<Arc<dyn Project>>;
}

/// An open project handle
#[async_trait]
pub trait Project: Send + Sync {
    /// Get object metadata
    async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo>;

    /// List the direct children of `prefix` in `bucket`
    ///
    /// `prefix` is either empty or ends in `/`. Deeper keys are collapsed
    /// into prefix entries.
    fn list_objects(&self, bucket: &str, prefix: &str) -> ListStream;

    /// Download `length` bytes starting at `offset` (`None` reads to the end)
    async fn download(&self, bucket: &str, key: &str, offset: u64, length: Option<u64>)
        -> Result<Bytes>;

    /// Release the handle
    async fn close(&self) -> Result<()>;
}
