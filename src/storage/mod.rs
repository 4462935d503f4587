//! Object storage module.
//!
//! The drive never talks to an SDK directly. Everything goes through the
//! [`ObjectStore`] capability, a flat key/value blob store addressed by
//! slash-delimited keys:
//! - Prefix listing with an optional delimiter (pages fully drained)
//! - Streaming reads
//! - Puts from memory or from a spooled file
//! - Server-side copy, delete and object tagging
//!
//! [`S3ObjectStore`] is the production backend, [`MemoryObjectStore`] backs
//! tests and local development.

mod memory;
mod s3;

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};

use crate::config::{StorageBackend, StorageConfig};
use crate::{DriveError, Result};

pub use memory::MemoryObjectStore;
pub use s3::S3ObjectStore;

/// Delimiter that turns a flat key space into folders.
pub const DELIMITER: &str = "/";

/// Tag key recording the uploading user.
pub const OWNER_TAG: &str = "username";

/// Metadata of a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    /// Full object key.
    pub key: String,
    /// Size in bytes. Zero-size objects are folder markers.
    pub size: u64,
    /// Last modification time, when the backend reports one.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Result of a prefix listing.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Objects directly matched by the listing.
    pub objects: Vec<ObjectInfo>,
    /// Rolled-up prefixes (subfolders) when a delimiter was given.
    pub common_prefixes: Vec<String>,
}

/// Byte stream of an object body.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// A readable object body.
pub struct ObjectBody {
    /// Content length in bytes.
    pub size: u64,
    /// Content type stored with the object, if any.
    pub content_type: Option<String>,
    /// Body stream.
    pub stream: ByteStream,
}

impl ObjectBody {
    /// Create a body from an in-memory buffer.
    pub fn from_bytes(data: Bytes, content_type: Option<String>) -> Self {
        Self {
            size: data.len() as u64,
            content_type,
            stream: futures::stream::once(async move { Ok(data) }).boxed(),
        }
    }

    /// Read the whole body into memory.
    pub async fn into_bytes(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(self.size as usize);
        while let Some(chunk) = self.stream.next().await {
            out.extend_from_slice(&chunk?);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for ObjectBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBody")
            .field("size", &self.size)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Data written by a put.
#[derive(Debug, Clone)]
pub enum PutBody {
    /// Zero-length object (folder marker).
    Empty,
    /// In-memory content.
    Bytes(Bytes),
    /// Content spooled to a local file.
    File(PathBuf),
}

/// Capability interface over an object store bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every key under `prefix`, following pagination to the end.
    ///
    /// With a delimiter, keys containing the delimiter after the prefix are
    /// rolled up into `common_prefixes`.
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> Result<Listing>;

    /// Get object metadata, `None` if the key does not exist.
    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>>;

    /// Open an object for streaming, `None` if the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<ObjectBody>>;

    /// Create or replace an object.
    async fn put(&self, key: &str, body: PutBody) -> Result<()>;

    /// Server-side copy within the bucket.
    async fn copy(&self, from: &str, to: &str) -> Result<()>;

    /// Delete a single object. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete many objects.
    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        for key in keys {
            self.delete(key).await?;
        }
        Ok(())
    }

    /// Read the object's tags.
    async fn get_tags(&self, key: &str) -> Result<Vec<(String, String)>>;

    /// Replace the object's tags.
    async fn put_tags(&self, key: &str, tags: &[(String, String)]) -> Result<()>;
}

/// Shared, dynamically dispatched store handle.
pub type SharedStore = Arc<dyn ObjectStore>;

/// Build the store selected by the configuration.
pub async fn connect(config: &StorageConfig) -> Result<SharedStore> {
    match config.backend {
        StorageBackend::S3 => {
            let store = S3ObjectStore::connect(config).await;
            tracing::info!(
                endpoint = %config.endpoint,
                bucket = %config.bucket,
                "Connected S3 object store"
            );
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object store; contents are lost on restart");
            Ok(Arc::new(MemoryObjectStore::new()))
        }
    }
}

/// Collect a paginated listing.
///
/// `fetch` is called with the continuation token of the previous page
/// (`None` first) and returns one page plus the next token. Pages are
/// fetched until no token comes back; nothing is returned before the last
/// page arrived.
pub(crate) async fn drain_pages<F, Fut>(mut fetch: F) -> Result<Listing>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Listing, Option<String>)>>,
{
    let mut listing = Listing::default();
    let mut token = None;
    loop {
        let (page, next) = fetch(token.take()).await?;
        listing.objects.extend(page.objects);
        listing.common_prefixes.extend(page.common_prefixes);
        match next {
            Some(next) => token = Some(next),
            None => return Ok(listing),
        }
    }
}

pub(crate) fn storage_error(operation: &str, detail: impl std::fmt::Display) -> DriveError {
    DriveError::Storage(format!("{operation} failed: {detail}"))
}
