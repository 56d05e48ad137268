//! Binary content storage.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use photostore_common::{ContentKey, Error, Result, StoreTarget};

/// Object storage for original and derivative bytes.
///
/// Objects are private; readers obtain time-limited signed URLs.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any existing object.
    async fn put(
        &self,
        key: &ContentKey,
        bytes: Bytes,
        content_type: &str,
        content_length: u64,
    ) -> Result<()>;

    /// A URL granting read access to `key` for `ttl`.
    async fn signed_read_url(&self, key: &ContentKey, ttl: Duration) -> Result<String>;

    /// Remove the object under `key`. Removing a missing key succeeds.
    async fn delete(&self, key: &ContentKey) -> Result<()>;
}

/// An object held by [`MemoryContentStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// In-process content store.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    objects: RwLock<HashMap<ContentKey, StoredObject>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ContentKey) -> Option<StoredObject> {
        self.objects.read().get(key).cloned()
    }

    pub fn contains(&self, key: &ContentKey) -> bool {
        self.objects.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    pub fn keys(&self) -> Vec<ContentKey> {
        let mut keys: Vec<_> = self.objects.read().keys().cloned().collect();
        keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        keys
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(
        &self,
        key: &ContentKey,
        bytes: Bytes,
        content_type: &str,
        content_length: u64,
    ) -> Result<()> {
        if bytes.len() as u64 != content_length {
            return Err(Error::store_write(
                StoreTarget::Content,
                key,
                format!(
                    "content length {} does not match body of {} bytes",
                    content_length,
                    bytes.len()
                ),
            ));
        }

        self.objects.write().insert(
            key.clone(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn signed_read_url(&self, key: &ContentKey, ttl: Duration) -> Result<String> {
        if !self.contains(key) {
            return Err(Error::not_found("object", key));
        }
        Ok(format!("memory://{}?expires_in={}", key, ttl.as_secs()))
    }

    async fn delete(&self, key: &ContentKey) -> Result<()> {
        self.objects.write().remove(key);
        Ok(())
    }
}
