//! S3-compatible object store backed by `aws-sdk-s3`.

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::{ByteStream as SdkByteStream, DateTime as SdkDateTime};
use aws_sdk_s3::types::{Delete, ObjectIdentifier, Tag, Tagging};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tokio_util::io::ReaderStream;

use super::{drain_pages, storage_error, Listing, ObjectBody, ObjectInfo, ObjectStore, PutBody};
use crate::config::StorageConfig;
use crate::Result;

/// Maximum number of keys accepted by one DeleteObjects call.
const DELETE_BATCH_SIZE: usize = 1000;

/// Object store over one bucket of an S3-compatible service.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Wrap an existing SDK client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Build a client from the storage configuration.
    ///
    /// Credentials are static; the endpoint points at the provider
    /// (Wasabi by default) instead of AWS.
    pub async fn connect(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "drive-config",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        Self::new(Client::from_conf(s3_config), &config.bucket)
    }

    /// Bucket this store operates on.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// `CopySource` value: bucket and key, each key segment URL-encoded.
    fn copy_source(&self, key: &str) -> String {
        let encoded: Vec<_> = key
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.bucket, encoded.join("/"))
    }
}

fn to_chrono(dt: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

fn non_negative(n: Option<i64>) -> u64 {
    n.unwrap_or(0).max(0) as u64
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list(&self, prefix: &str, delimiter: Option<&str>) -> Result<Listing> {
        let listing = drain_pages(|continuation| async move {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(delimiter) = delimiter {
                request = request.delimiter(delimiter);
            }
            if let Some(token) = continuation {
                request = request.continuation_token(token);
            }

            let page = request
                .send()
                .await
                .map_err(|e| storage_error("list_objects_v2", DisplayErrorContext(&e)))?;

            let mut listing = Listing::default();
            for object in page.contents() {
                listing.objects.push(ObjectInfo {
                    key: object.key().unwrap_or_default().to_string(),
                    size: non_negative(object.size()),
                    last_modified: object.last_modified().and_then(to_chrono),
                });
            }
            for common in page.common_prefixes() {
                if let Some(p) = common.prefix() {
                    listing.common_prefixes.push(p.to_string());
                }
            }

            let next = match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => Some(token.to_string()),
                _ => None,
            };
            Ok::<_, crate::DriveError>((listing, next))
        })
        .await?;

        tracing::trace!(
            prefix,
            objects = listing.objects.len(),
            prefixes = listing.common_prefixes.len(),
            "Listed prefix"
        );
        Ok(listing)
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectInfo>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(out) => Ok(Some(ObjectInfo {
                key: key.to_string(),
                size: non_negative(out.content_length()),
                last_modified: out.last_modified().and_then(to_chrono),
            })),
            Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(None),
            Err(e) => Err(storage_error("head_object", DisplayErrorContext(&e))),
        }
    }

    async fn get(&self, key: &str) -> Result<Option<ObjectBody>> {
        match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(out) => {
                let size = non_negative(out.content_length());
                let content_type = out.content_type().map(str::to_string);
                let reader = out.body.into_async_read();
                Ok(Some(ObjectBody {
                    size,
                    content_type,
                    stream: ReaderStream::new(reader).boxed(),
                }))
            }
            Err(e) if e.as_service_error().is_some_and(|se| se.is_no_such_key()) => Ok(None),
            Err(e) => Err(storage_error("get_object", DisplayErrorContext(&e))),
        }
    }

    async fn put(&self, key: &str, body: PutBody) -> Result<()> {
        let mut request = self.client.put_object().bucket(&self.bucket).key(key);

        request = match body {
            PutBody::Empty => request.body(SdkByteStream::from_static(b"")),
            PutBody::Bytes(data) => request.body(SdkByteStream::from(data)),
            PutBody::File(path) => {
                let stream = SdkByteStream::from_path(&path)
                    .await
                    .map_err(|e| storage_error("put_object", e))?;
                request.body(stream)
            }
        };

        if !key.ends_with('/') {
            if let Some(mime) = mime_guess::from_path(key).first() {
                request = request.content_type(mime.to_string());
            }
        }

        request
            .send()
            .await
            .map_err(|e| storage_error("put_object", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> Result<()> {
        self.client
            .copy_object()
            .bucket(&self.bucket)
            .key(to)
            .copy_source(self.copy_source(from))
            .send()
            .await
            .map_err(|e| storage_error("copy_object", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("delete_object", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        for batch in keys.chunks(DELETE_BATCH_SIZE) {
            let objects = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| storage_error("delete_objects", e))?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| storage_error("delete_objects", e))?;

            let out = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| storage_error("delete_objects", DisplayErrorContext(&e)))?;

            if let Some(first) = out.errors().first() {
                return Err(storage_error(
                    "delete_objects",
                    format!(
                        "{} keys not deleted, first: {} ({})",
                        out.errors().len(),
                        first.key().unwrap_or_default(),
                        first.message().unwrap_or_default()
                    ),
                ));
            }
        }
        Ok(())
    }

    async fn get_tags(&self, key: &str) -> Result<Vec<(String, String)>> {
        let out = self
            .client
            .get_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("get_object_tagging", DisplayErrorContext(&e)))?;

        Ok(out
            .tag_set()
            .iter()
            .map(|tag| (tag.key().to_string(), tag.value().to_string()))
            .collect())
    }

    async fn put_tags(&self, key: &str, tags: &[(String, String)]) -> Result<()> {
        let tag_set = tags
            .iter()
            .map(|(k, v)| Tag::builder().key(k).value(v).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| storage_error("put_object_tagging", e))?;

        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(|e| storage_error("put_object_tagging", e))?;

        self.client
            .put_object_tagging()
            .bucket(&self.bucket)
            .key(key)
            .tagging(tagging)
            .send()
            .await
            .map_err(|e| storage_error("put_object_tagging", DisplayErrorContext(&e)))?;
        Ok(())
    }
}
