//! Photo and thumbnail record storage.

use async_trait::async_trait;
use photostore_common::{Error, PhotoId, Result, ThumbnailId};
use photostore_db::models::{Photo, Thumbnail};
use photostore_db::pool::{get_conn, DbPool};
use photostore_db::queries::{photos, thumbnails};
use rusqlite::Connection;

/// Relational storage for photo and thumbnail records.
///
/// Saves validate the record first and write nothing on a violation.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn save_photo(&self, photo: &Photo) -> Result<Photo>;

    /// The owning photo must already be saved.
    async fn save_thumbnail(&self, thumbnail: &Thumbnail) -> Result<Thumbnail>;

    /// Every photo, newest upload first.
    async fn find_all(&self) -> Result<Vec<Photo>>;

    async fn find_photo(&self, id: PhotoId) -> Result<Option<Photo>>;

    async fn find_thumbnail(&self, id: ThumbnailId) -> Result<Option<Thumbnail>>;

    async fn find_thumbnails(&self, photo_id: PhotoId) -> Result<Vec<Thumbnail>>;

    /// Delete a photo and, by cascade, its thumbnails.
    ///
    /// Returns `false` if no such photo existed.
    async fn delete_photo(&self, id: PhotoId) -> Result<bool>;
}

/// SQLite metadata store.
///
/// Queries are synchronous, so each call runs on the blocking pool with its
/// own pooled connection.
#[derive(Clone)]
pub struct SqliteMetadataStore {
    pool: DbPool,
}

impl SqliteMetadataStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            f(&conn)
        })
        .await
        .map_err(|e| Error::internal(format!("Database task failed: {}", e)))?
    }
}

#[async_trait]
impl MetadataStore for SqliteMetadataStore {
    async fn save_photo(&self, photo: &Photo) -> Result<Photo> {
        let photo = photo.clone();
        self.run(move |conn| {
            photos::insert_photo(conn, &photo)?;
            Ok(photo)
        })
        .await
    }

    async fn save_thumbnail(&self, thumbnail: &Thumbnail) -> Result<Thumbnail> {
        let thumbnail = thumbnail.clone();
        self.run(move |conn| {
            thumbnails::insert_thumbnail(conn, &thumbnail)?;
            Ok(thumbnail)
        })
        .await
    }

    async fn find_all(&self) -> Result<Vec<Photo>> {
        self.run(photos::list_photos).await
    }

    async fn find_photo(&self, id: PhotoId) -> Result<Option<Photo>> {
        self.run(move |conn| photos::get_photo(conn, id)).await
    }

    async fn find_thumbnail(&self, id: ThumbnailId) -> Result<Option<Thumbnail>> {
        self.run(move |conn| thumbnails::get_thumbnail(conn, id))
            .await
    }

    async fn find_thumbnails(&self, photo_id: PhotoId) -> Result<Vec<Thumbnail>> {
        self.run(move |conn| thumbnails::list_thumbnails_for_photo(conn, photo_id))
            .await
    }

    async fn delete_photo(&self, id: PhotoId) -> Result<bool> {
        self.run(move |conn| photos::delete_photo(conn, id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{SubsecRound, Utc};
    use photostore_common::ThumbnailKind;
    use photostore_db::pool::init_memory_pool;

    fn store() -> SqliteMetadataStore {
        SqliteMetadataStore::new(init_memory_pool().unwrap())
    }

    fn photo() -> Photo {
        Photo {
            id: PhotoId::new(),
            size: 2_000_000,
            width: 1000,
            height: 800,
            mime: "image/jpeg".into(),
            uploaded_at: Utc::now().trunc_subsecs(6),
        }
    }

    fn thumbnail(photo_id: PhotoId, kind: ThumbnailKind) -> Thumbnail {
        Thumbnail {
            id: ThumbnailId::new(),
            photo_id,
            size: 1000,
            width: 500,
            height: 400,
            mime: "image/png".into(),
            kind,
            uploaded_at: Utc::now().trunc_subsecs(6),
        }
    }

    #[tokio::test]
    async fn save_and_find() {
        let store = store();
        let p = store.save_photo(&photo()).await.unwrap();
        let t = store
            .save_thumbnail(&thumbnail(p.id, ThumbnailKind::Normal))
            .await
            .unwrap();

        assert_eq!(store.find_photo(p.id).await.unwrap(), Some(p.clone()));
        assert_eq!(store.find_thumbnail(t.id).await.unwrap(), Some(t.clone()));
        assert_eq!(store.find_thumbnails(p.id).await.unwrap(), vec![t]);
        assert_eq!(store.find_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_thumbnail_saves() {
        let store = store();
        let p = store.save_photo(&photo()).await.unwrap();

        let a = thumbnail(p.id, ThumbnailKind::Normal);
        let b = thumbnail(p.id, ThumbnailKind::Blur);
        let (ra, rb) = tokio::join!(store.save_thumbnail(&a), store.save_thumbnail(&b));
        ra.unwrap();
        rb.unwrap();

        assert_eq!(store.find_thumbnails(p.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn invalid_photo_not_written() {
        let store = store();
        let mut p = photo();
        p.mime = String::new();

        let err = store.save_photo(&p).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(store.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_cascades() {
        let store = store();
        let p = store.save_photo(&photo()).await.unwrap();
        let t = store
            .save_thumbnail(&thumbnail(p.id, ThumbnailKind::Blur))
            .await
            .unwrap();

        assert!(store.delete_photo(p.id).await.unwrap());
        assert!(store.find_thumbnail(t.id).await.unwrap().is_none());
        assert!(!store.delete_photo(p.id).await.unwrap());
    }
}
