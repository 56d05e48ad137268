//! S3-compatible content store.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use photostore_common::{ContentKey, Error, Result, StoreTarget};
use tracing::{debug, error};

use super::content::ContentStore;
use crate::config::S3Settings;

/// Content store backed by an S3-compatible object store.
///
/// Objects are written without an ACL so they stay private to the bucket
/// owner; reads go through presigned GET URLs.
pub struct S3ContentStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl std::fmt::Debug for S3ContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ContentStore")
            .field("bucket", &self.bucket)
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl S3ContentStore {
    /// Build a client for the endpoint and static credentials in `settings`.
    pub async fn new(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.key_id.clone(),
            settings.access_key.clone(),
            None,
            None,
            "photostore-config",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .endpoint_url(settings.endpoint.clone())
            .credentials_provider(credentials)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.force_path_style)
            .build();

        Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: settings.bucket.clone(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ContentStore for S3ContentStore {
    async fn put(
        &self,
        key: &ContentKey,
        bytes: Bytes,
        content_type: &str,
        content_length: u64,
    ) -> Result<()> {
        let length = i64::try_from(content_length).map_err(|_| {
            Error::store_write(StoreTarget::Content, key, "content length exceeds i64")
        })?;

        debug!(key = %key, content_type, content_length, "putting object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .content_type(content_type)
            .content_length(length)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                error!(key = %key, error = %DisplayErrorContext(&e), "S3 put_object failed");
                Error::store_write(StoreTarget::Content, key, DisplayErrorContext(&e))
            })?;

        Ok(())
    }

    async fn signed_read_url(&self, key: &ContentKey, ttl: Duration) -> Result<String> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| Error::internal(format!("Invalid presign TTL {:?}: {}", ttl, e)))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .presigned(presigning)
            .await
            .map_err(|e| {
                Error::internal(format!(
                    "Failed to presign {}: {}",
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(request.uri().to_string())
    }

    async fn delete(&self, key: &ContentKey) -> Result<()> {
        debug!(key = %key, "deleting object");
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| {
                error!(key = %key, error = %DisplayErrorContext(&e), "S3 delete_object failed");
                Error::store_write(StoreTarget::Content, key, DisplayErrorContext(&e))
            })?;

        Ok(())
    }
}
