//! Object store abstraction.
//!
//! Photos live in a flat key space inside a single bucket. The server only
//! needs five primitives from the storage backend, captured by the
//! [`ObjectStore`] trait:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 HTTP handlers                │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │              ObjectStore trait               │
//! │      list / get / put / delete / head        │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!                        ▼
//! ┌──────────────────────────────────────────────┐
//! │      S3ObjectStore (S3, MinIO, R2, ...)      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Implementations must report a missing key as [`StoreError::NotFound`] from
//! `get` and `head`. `delete` on a missing key is allowed to succeed silently,
//! which is why the delete handler probes with `head` first.

mod s3;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

pub use s3::{create_s3_client, S3ObjectStore};

/// Content type used when the store has no metadata for an object.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Listing entry for a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,

    /// Size in bytes, if reported by the store
    pub size: Option<u64>,

    /// Last modification time in seconds since the Unix epoch
    pub last_modified: Option<i64>,
}

impl ObjectInfo {
    /// Create a listing entry with only a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size: None,
            last_modified: None,
        }
    }
}

/// Object content together with its stored content type.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Raw object bytes
    pub data: Bytes,

    /// Content type recorded when the object was written
    pub content_type: Option<String>,
}

impl StoredObject {
    /// Content type to serve, falling back to [`DEFAULT_CONTENT_TYPE`].
    pub fn content_type_or_default(&self) -> &str {
        self.content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE)
    }
}

/// Key/blob storage backend.
///
/// All durable state of the gallery lives behind this trait. Handlers hold it
/// behind an `Arc` and never mutate any in-process state.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object in the store, following pagination to the end.
    async fn list(&self) -> Result<Vec<ObjectInfo>, StoreError>;

    /// Fetch an object's content and content type.
    async fn get(&self, key: &str) -> Result<StoredObject, StoreError>;

    /// Write an object under `key` with the given content type.
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Remove an object. May succeed even if the key does not exist.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Probe an object's metadata without downloading its content.
    async fn head(&self, key: &str) -> Result<ObjectInfo, StoreError>;
}
