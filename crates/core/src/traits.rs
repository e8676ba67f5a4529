//! ObjectStore trait definition
//!
//! This trait is the boundary to the object-store client. It allows the
//! entity model to be decoupled from the specific S3 SDK implementation;
//! `ufs-s3` implements it over aws-sdk-s3 and [`crate::memory::MemoryStore`]
//! implements it in process.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::ObjectPath;

/// Metadata for an object or common prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Object key (bucket-relative)
    pub key: String,

    /// Size in bytes (None for prefixes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<i64>,

    /// Human-readable size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_human: Option<String>,

    /// Last modified timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<jiff::Timestamp>,

    /// ETag (usually MD5 for single-part uploads)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    /// Content type
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Whether this is a common prefix rather than an object
    pub is_dir: bool,
}

impl ObjectInfo {
    /// Create a new ObjectInfo for an object
    pub fn file(key: impl Into<String>, size: i64) -> Self {
        Self {
            key: key.into(),
            size_bytes: Some(size),
            size_human: Some(humansize::format_size(size.max(0) as u64, humansize::BINARY)),
            last_modified: None,
            etag: None,
            content_type: None,
            is_dir: false,
        }
    }

    /// Create a new ObjectInfo for a common prefix
    pub fn dir(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            size_bytes: None,
            size_human: None,
            last_modified: None,
            etag: None,
            content_type: None,
            is_dir: true,
        }
    }

    /// Object size, treating a missing or negative size as zero
    pub fn size(&self) -> u64 {
        self.size_bytes.unwrap_or(0).max(0) as u64
    }
}

/// Result of a single list request (one page)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListResult {
    /// Listed objects and, for delimited listings, common prefixes
    pub items: Vec<ObjectInfo>,

    /// Whether the result is truncated (more pages available)
    pub truncated: bool,

    /// Continuation token for the next page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

/// Options for a single list request
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Key prefix to filter by
    pub prefix: String,

    /// Delimiter for grouping (usually "/"); None lists recursively
    pub delimiter: Option<String>,

    /// Maximum number of keys to return in this page
    pub max_keys: Option<i32>,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,
}

/// A key the store refused to delete inside an otherwise successful request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyError {
    pub key: String,
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Outcome of one bulk-delete request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Keys the store confirmed as deleted
    pub deleted: Vec<String>,
    /// Keys the store reported as failed
    pub errors: Vec<KeyError>,
}

/// Trait for the object-store client
///
/// Error contract: a missing object is reported as `Error::NotFound`, a
/// permission rejection as `Error::AccessDenied`, anything else as another
/// variant. Callers rely on that distinction and never on message text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of objects in a bucket
    ///
    /// Keys are returned in the store's native lexicographic order.
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult>;

    /// Get object metadata without fetching the body
    async fn head_object(&self, path: &ObjectPath) -> Result<ObjectInfo>;

    /// Issue a GET and report the object's metadata, discarding the body
    async fn fetch_object_info(&self, path: &ObjectPath) -> Result<ObjectInfo>;

    /// Get object content as bytes
    async fn get_object(&self, path: &ObjectPath) -> Result<Vec<u8>>;

    /// Store bytes under a key, replacing any existing object
    async fn put_object(&self, path: &ObjectPath, data: Vec<u8>) -> Result<ObjectInfo>;

    /// Delete a single object
    async fn delete_object(&self, path: &ObjectPath) -> Result<()>;

    /// Delete up to one batch of keys in a single request
    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<DeleteOutcome>;

    /// Server-side copy within the store
    async fn copy_object(&self, src: &ObjectPath, dst: &ObjectPath) -> Result<()>;

    /// Stream an object into a local file, returning the bytes written
    async fn download_to_file(&self, src: &ObjectPath, dst: &Path) -> Result<u64>;

    /// Upload a local file as an object
    async fn upload_from_file(&self, src: &Path, dst: &ObjectPath) -> Result<()>;
}
