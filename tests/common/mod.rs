//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which wires an in-memory content store and an
//! in-memory SQLite metadata store into a full [`AppContext`], fault
//! injecting store wrappers, and encoded image fixtures.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use photostore::config::Config;
use photostore::server::{create_router, AppContext};
use photostore::store::{ContentStore, MemoryContentStore, MetadataStore, SqliteMetadataStore};
use photostore_common::{ContentKey, Error, PhotoId, Result, StoreTarget, ThumbnailId};
use photostore_db::models::{Photo, Thumbnail};
use photostore_db::pool::init_memory_pool;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by
/// in-memory stores.
pub struct TestHarness {
    pub ctx: AppContext,
    pub content: Arc<MemoryContentStore>,
    pub metadata: Arc<SqliteMetadataStore>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let content = Arc::new(MemoryContentStore::new());
        let metadata = Arc::new(SqliteMetadataStore::new(
            init_memory_pool().expect("failed to create in-memory pool"),
        ));
        let ctx = AppContext::new(config, content.clone(), metadata.clone());
        Self {
            ctx,
            content,
            metadata,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, format)
        .expect("failed to encode fixture");
    buf.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

// ---------------------------------------------------------------------------
// Fault injection
// ---------------------------------------------------------------------------

/// Content store that fails puts for keys under a prefix and counts every
/// put attempt.
pub struct FaultyContentStore {
    pub inner: MemoryContentStore,
    fail_prefix: Option<&'static str>,
    puts: AtomicUsize,
}

impl FaultyContentStore {
    pub fn healthy() -> Self {
        Self {
            inner: MemoryContentStore::new(),
            fail_prefix: None,
            puts: AtomicUsize::new(0),
        }
    }

    pub fn failing(prefix: &'static str) -> Self {
        Self {
            fail_prefix: Some(prefix),
            ..Self::healthy()
        }
    }

    pub fn put_attempts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for FaultyContentStore {
    async fn put(
        &self,
        key: &ContentKey,
        bytes: Bytes,
        content_type: &str,
        content_length: u64,
    ) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if let Some(prefix) = self.fail_prefix {
            if key.as_str().starts_with(prefix) {
                return Err(Error::store_write(
                    StoreTarget::Content,
                    key.as_str(),
                    "injected failure",
                ));
            }
        }
        self.inner.put(key, bytes, content_type, content_length).await
    }

    async fn signed_read_url(&self, key: &ContentKey, ttl: Duration) -> Result<String> {
        self.inner.signed_read_url(key, ttl).await
    }

    async fn delete(&self, key: &ContentKey) -> Result<()> {
        self.inner.delete(key).await
    }
}

/// Metadata store that can refuse photo or thumbnail rows and counts every
/// save attempt.
pub struct FaultyMetadataStore {
    pub inner: SqliteMetadataStore,
    fail_photos: bool,
    fail_thumbnails: bool,
    saves: AtomicUsize,
}

impl FaultyMetadataStore {
    pub fn healthy() -> Self {
        Self {
            inner: SqliteMetadataStore::new(
                init_memory_pool().expect("failed to create in-memory pool"),
            ),
            fail_photos: false,
            fail_thumbnails: false,
            saves: AtomicUsize::new(0),
        }
    }

    pub fn failing_photos() -> Self {
        Self {
            fail_photos: true,
            ..Self::healthy()
        }
    }

    pub fn failing_thumbnails() -> Self {
        Self {
            fail_thumbnails: true,
            ..Self::healthy()
        }
    }

    pub fn save_attempts(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataStore for FaultyMetadataStore {
    async fn save_photo(&self, photo: &Photo) -> Result<Photo> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_photos {
            return Err(Error::store_write(
                StoreTarget::Metadata,
                format!("photos/{}", photo.id),
                "injected failure",
            ));
        }
        self.inner.save_photo(photo).await
    }

    async fn save_thumbnail(&self, thumbnail: &Thumbnail) -> Result<Thumbnail> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_thumbnails {
            return Err(Error::store_write(
                StoreTarget::Metadata,
                format!("thumbnails/{}", thumbnail.id),
                "injected failure",
            ));
        }
        self.inner.save_thumbnail(thumbnail).await
    }

    async fn find_all(&self) -> Result<Vec<Photo>> {
        self.inner.find_all().await
    }

    async fn find_photo(&self, id: PhotoId) -> Result<Option<Photo>> {
        self.inner.find_photo(id).await
    }

    async fn find_thumbnail(&self, id: ThumbnailId) -> Result<Option<Thumbnail>> {
        self.inner.find_thumbnail(id).await
    }

    async fn find_thumbnails(&self, photo_id: PhotoId) -> Result<Vec<Thumbnail>> {
        self.inner.find_thumbnails(photo_id).await
    }

    async fn delete_photo(&self, id: PhotoId) -> Result<bool> {
        self.inner.delete_photo(id).await
    }
}
