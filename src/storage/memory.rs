//! In-memory object store.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{Listing, ObjectBody, ObjectInfo, ObjectStore, PutBody};
use crate::Result;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    last_modified: DateTime<Utc>,
    tags: Vec<(String, String)>,
}

/// Object store kept in an ordered map.
///
/// Keys are kept sorted so listings come back in the same lexicographic
/// order S3 uses.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// All keys currently stored, in order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Content of an object, if present.
    pub async fn read(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).map(|o| o.data.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> Result<Listing> {
        let objects = self.objects.read().await;
        let mut listing = Listing::default();
        let mut prefixes = BTreeSet::new();

        for (key, object) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };

            if let Some(delimiter) = delimiter.filter(|d| !d.is_empty()) {
                if let Some(idx) = rest.find(delimiter) {
                    prefixes.insert(format!("{prefix}{}", &rest[..idx + delimiter.len()]));
                    continue;
                }
            }

            listing.objects.push(ObjectInfo {
                key: key.clone(),
                size: object.data.len() as u64,
                last_modified: Some(object.last_modified),
            });
        }

        listing.common_prefixes = prefixes.into_iter().collect();
        Ok(listing)
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>> {
        Ok(self.objects.read().await.get(key).map(|o| ObjectInfo {
            key: key.to_string(),
            size: o.data.len() as u64,
            last_modified: Some(o.last_modified),
        }))
    }

    async fn get(&self, key: &str) -> Result<Option<ObjectBody>> {
        let data = self.read(key).await;
        Ok(data.map(|data| {
            let content_type = mime_guess::from_path(key).first().map(|m| m.to_string());
            ObjectBody::from_bytes(data, content_type)
        }))
    }

    async fn put(&self, key: &str, body: PutBody) -> Result<()> {
        let data = match body {
            PutBody::Empty => Bytes::new(),
            PutBody::Bytes(data) => data,
            PutBody::File(path) => Bytes::from(tokio::fs::read(&path).await?),
        };

        self.objects.write().await.insert(
            key.to_string(),
            StoredObject {
                data,
                last_modified: Utc::now(),
                tags: Vec::new(),
            },
        );
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        let mut objects = self.objects.write().await;
        let source = objects
            .get(from)
            .cloned()
            .ok_or_else(|| super::storage_error("copy", format!("no such key: {from}")))?;
        objects.insert(
            to.to_string(),
            StoredObject {
                last_modified: Utc::now(),
                ..source
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn get_tags(&self, key: &str) -> Result<Vec<(String, String)>> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|o| o.tags.clone())
            .ok_or_else(|| super::storage_error("get_tags", format!("no such key: {key}")))
    }

    async fn put_tags(&self, key: &str, tags: &[(String, String)]) -> Result<()> {
        let mut objects = self.objects.write().await;
        let object = objects
            .get_mut(key)
            .ok_or_else(|| super::storage_error("put_tags", format!("no such key: {key}")))?;
        object.tags = tags.to_vec();
        Ok(())
    }
}
