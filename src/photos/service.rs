use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use photostore_common::{ContentKey, Error, PhotoId, Result, ThumbnailId};
use photostore_db::models::{Photo, PhotoWithThumbnails, Thumbnail};
use serde::Serialize;

use crate::store::{ContentStore, MetadataStore};

/// A time-limited read URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub url: String,
    /// Seconds until the URL stops working.
    pub expires_in: u64,
}

/// Outcome of deleting a photo.
///
/// Metadata removal is authoritative. Content removal is best effort and
/// keys that could not be removed are listed in `orphaned_keys`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub photo_id: PhotoId,
    pub thumbnails_removed: usize,
    pub removed_keys: Vec<ContentKey>,
    pub orphaned_keys: Vec<ContentKey>,
}

/// High-level photo operations over both stores.
pub struct PhotoService {
    content: Arc<dyn ContentStore>,
    metadata: Arc<dyn MetadataStore>,
    url_ttl: Duration,
}

impl PhotoService {
    pub fn new(
        content: Arc<dyn ContentStore>,
        metadata: Arc<dyn MetadataStore>,
        url_ttl: Duration,
    ) -> Self {
        Self {
            content,
            metadata,
            url_ttl,
        }
    }

    /// All photos, newest first.
    pub async fn list(&self) -> Result<Vec<Photo>> {
        self.metadata.find_all().await
    }

    pub async fn get(&self, id: PhotoId) -> Result<PhotoWithThumbnails> {
        let photo = self
            .metadata
            .find_photo(id)
            .await?
            .ok_or_else(|| Error::not_found("photo", id))?;
        let thumbnails = self.metadata.find_thumbnails(id).await?;
        Ok(PhotoWithThumbnails { photo, thumbnails })
    }

    pub async fn thumbnail(&self, id: ThumbnailId) -> Result<Thumbnail> {
        self.metadata
            .find_thumbnail(id)
            .await?
            .ok_or_else(|| Error::not_found("thumbnail", id))
    }

    /// Signed URL for a photo's original bytes.
    pub async fn photo_url(&self, id: PhotoId) -> Result<SignedUrl> {
        let photo = self
            .metadata
            .find_photo(id)
            .await?
            .ok_or_else(|| Error::not_found("photo", id))?;
        self.sign(&photo.content_key()).await
    }

    /// Signed URL for a thumbnail's bytes.
    pub async fn thumbnail_url(&self, id: ThumbnailId) -> Result<SignedUrl> {
        let thumbnail = self.thumbnail(id).await?;
        self.sign(&thumbnail.content_key()).await
    }

    async fn sign(&self, key: &ContentKey) -> Result<SignedUrl> {
        let url = self.content.signed_read_url(key, self.url_ttl).await?;
        Ok(SignedUrl {
            url,
            expires_in: self.url_ttl.as_secs(),
        })
    }

    /// Delete a photo, its thumbnails and their content.
    pub async fn delete(&self, id: PhotoId) -> Result<DeletionReport> {
        let thumbnails = self.metadata.find_thumbnails(id).await?;

        if !self.metadata.delete_photo(id).await? {
            return Err(Error::not_found("photo", id));
        }

        let keys: Vec<ContentKey> = std::iter::once(ContentKey::photo(id))
            .chain(thumbnails.iter().map(Thumbnail::content_key))
            .collect();

        let results = join_all(keys.iter().map(|key| self.content.delete(key))).await;

        let mut removed_keys = Vec::new();
        let mut orphaned_keys = Vec::new();
        for (key, result) in keys.into_iter().zip(results) {
            match result {
                Ok(()) => removed_keys.push(key),
                Err(e) => {
                    tracing::warn!(photo_id = %id, key = %key, "Failed to delete content: {}", e);
                    orphaned_keys.push(key);
                }
            }
        }

        tracing::info!(
            photo_id = %id,
            thumbnails = thumbnails.len(),
            orphaned = orphaned_keys.len(),
            "Deleted photo"
        );

        Ok(DeletionReport {
            photo_id: id,
            thumbnails_removed: thumbnails.len(),
            removed_keys,
            orphaned_keys,
        })
    }
}
