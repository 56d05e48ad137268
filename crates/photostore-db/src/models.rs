//! Records persisted in the metadata store.
//!
//! These are plain structs; mapping to and from table rows happens in
//! explicit functions inside each backend's query module.

use chrono::{DateTime, Utc};
use photostore_common::{ContentKey, PhotoId, ThumbnailId, ThumbnailKind};
use serde::{Deserialize, Serialize};

/// An uploaded original image.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    pub id: PhotoId,
    /// Byte size declared by the uploader.
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub mime: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Photo {
    /// Content store key holding the original bytes.
    pub fn content_key(&self) -> ContentKey {
        ContentKey::photo(self.id)
    }
}

/// A derivative image belonging to exactly one [`Photo`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thumbnail {
    pub id: ThumbnailId,
    pub photo_id: PhotoId,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub mime: String,
    pub kind: ThumbnailKind,
    pub uploaded_at: DateTime<Utc>,
}

impl Thumbnail {
    /// Content store key holding the derivative bytes.
    pub fn content_key(&self) -> ContentKey {
        ContentKey::thumbnail(self.id)
    }
}

/// A photo together with its thumbnails, in variant order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoWithThumbnails {
    pub photo: Photo,
    pub thumbnails: Vec<Thumbnail>,
}
