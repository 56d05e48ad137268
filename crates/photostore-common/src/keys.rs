//! Content store key scheme.
//!
//! Originals live under `photos/{photoId}` and derivatives under
//! `thumbnails/{thumbnailId}`. Keys are opaque to the stores; no listing or
//! directory semantics are assumed.

use serde::Serialize;
use std::fmt;

use crate::ids::{PhotoId, ThumbnailId};

const PHOTO_PREFIX: &str = "photos/";
const THUMBNAIL_PREFIX: &str = "thumbnails/";

/// A key addressing one object in the content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContentKey(String);

impl ContentKey {
    /// Key of the original bytes for a photo.
    pub fn photo(id: PhotoId) -> Self {
        Self(format!("{PHOTO_PREFIX}{id}"))
    }

    /// Key of the derivative bytes for a thumbnail.
    pub fn thumbnail(id: ThumbnailId) -> Self {
        Self(format!("{THUMBNAIL_PREFIX}{id}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key addresses an original photo.
    pub fn is_photo(&self) -> bool {
        self.0.starts_with(PHOTO_PREFIX)
    }

    /// Whether this key addresses a thumbnail.
    pub fn is_thumbnail(&self) -> bool {
        self.0.starts_with(THUMBNAIL_PREFIX)
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_key_layout() {
        let id = PhotoId::new();
        let key = ContentKey::photo(id);
        assert_eq!(key.as_str(), format!("photos/{}", id));
        assert!(key.is_photo());
        assert!(!key.is_thumbnail());
    }

    #[test]
    fn thumbnail_key_layout() {
        let id = ThumbnailId::new();
        let key = ContentKey::thumbnail(id);
        assert_eq!(key.to_string(), format!("thumbnails/{}", id));
        assert!(key.is_thumbnail());
    }

    #[test]
    fn distinct_ids_give_distinct_keys() {
        assert_ne!(ContentKey::photo(PhotoId::new()), ContentKey::photo(PhotoId::new()));
    }
}
