//! PostgreSQL metadata store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use photostore_common::{Error, PhotoId, Result, ThumbnailId, ThumbnailKind};
use photostore_db::models::{Photo, Thumbnail};
use photostore_db::validation::{validate_photo, validate_thumbnail};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::metadata::MetadataStore;
use crate::config::PostgresConfig;

const CREATE_PHOTOS: &str = "CREATE TABLE IF NOT EXISTS photos (
    id UUID PRIMARY KEY,
    size BIGINT NOT NULL CHECK (size BETWEEN 1 AND 10000000000),
    width SMALLINT NOT NULL CHECK (width >= 1),
    height SMALLINT NOT NULL CHECK (height >= 1),
    mime VARCHAR(32) NOT NULL CHECK (length(mime) >= 1),
    uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

const CREATE_THUMBNAILS: &str = "CREATE TABLE IF NOT EXISTS thumbnails (
    id UUID PRIMARY KEY,
    photo_id UUID NOT NULL REFERENCES photos(id) ON DELETE CASCADE,
    size INTEGER NOT NULL CHECK (size >= 1),
    width SMALLINT NOT NULL CHECK (width >= 1),
    height SMALLINT NOT NULL CHECK (height >= 1),
    mime VARCHAR(32) NOT NULL CHECK (length(mime) >= 1),
    kind VARCHAR(16) NOT NULL CHECK (kind IN ('NORMAL', 'BLUR')),
    uploaded_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

const CREATE_THUMBNAILS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_thumbnails_photo_id ON thumbnails(photo_id)";

const PHOTO_COLUMNS: &str = "id, size, width, height, mime, uploaded_at";
const THUMBNAIL_COLUMNS: &str = "id, photo_id, size, width, height, mime, kind, uploaded_at";

/// Metadata store backed by PostgreSQL through a `sqlx` pool.
#[derive(Debug, Clone)]
pub struct PostgresMetadataStore {
    pool: PgPool,
}

impl PostgresMetadataStore {
    /// Connect using `config` and create the tables if they do not exist.
    pub async fn connect(config: &PostgresConfig) -> Result<Self> {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.username);
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| Error::database(format!("Failed to connect to Postgres: {}", e)))?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the tables if needed.
    pub async fn from_pool(pool: PgPool) -> Result<Self> {
        run_migrations(&pool)
            .await
            .map_err(|e| Error::database(format!("Failed to create tables: {}", e)))?;
        Ok(Self { pool })
    }
}

async fn run_migrations(pool: &PgPool) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(CREATE_PHOTOS).execute(pool).await?;
    sqlx::query(CREATE_THUMBNAILS).execute(pool).await?;
    sqlx::query(CREATE_THUMBNAILS_INDEX).execute(pool).await?;
    Ok(())
}

fn db_err(e: sqlx::Error) -> Error {
    Error::database(e.to_string())
}

fn decode_err(column: &str, detail: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: detail.to_string().into(),
    }
}

fn small_to_u32(row: &PgRow, column: &str) -> std::result::Result<u32, sqlx::Error> {
    let value: i16 = row.try_get(column)?;
    u32::try_from(value).map_err(|e| decode_err(column, e))
}

fn photo_from_row(row: &PgRow) -> std::result::Result<Photo, sqlx::Error> {
    let size: i64 = row.try_get("size")?;
    Ok(Photo {
        id: PhotoId::from(row.try_get::<Uuid, _>("id")?),
        size: u64::try_from(size).map_err(|e| decode_err("size", e))?,
        width: small_to_u32(row, "width")?,
        height: small_to_u32(row, "height")?,
        mime: row.try_get("mime")?,
        uploaded_at: row.try_get::<DateTime<Utc>, _>("uploaded_at")?,
    })
}

fn thumbnail_from_row(row: &PgRow) -> std::result::Result<Thumbnail, sqlx::Error> {
    let size: i32 = row.try_get("size")?;
    let kind: String = row.try_get("kind")?;
    Ok(Thumbnail {
        id: ThumbnailId::from(row.try_get::<Uuid, _>("id")?),
        photo_id: PhotoId::from(row.try_get::<Uuid, _>("photo_id")?),
        size: u64::try_from(size).map_err(|e| decode_err("size", e))?,
        width: small_to_u32(row, "width")?,
        height: small_to_u32(row, "height")?,
        mime: row.try_get("mime")?,
        kind: kind
            .parse::<ThumbnailKind>()
            .map_err(|e| decode_err("kind", e))?,
        uploaded_at: row.try_get::<DateTime<Utc>, _>("uploaded_at")?,
    })
}

#[async_trait]
impl MetadataStore for PostgresMetadataStore {
    async fn save_photo(&self, photo: &Photo) -> Result<Photo> {
        validate_photo(photo)?;

        sqlx::query(
            "INSERT INTO photos (id, size, width, height, mime, uploaded_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*photo.id.as_uuid())
        .bind(photo.size as i64)
        .bind(photo.width as i16)
        .bind(photo.height as i16)
        .bind(&photo.mime)
        .bind(photo.uploaded_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(photo.clone())
    }

    async fn save_thumbnail(&self, thumbnail: &Thumbnail) -> Result<Thumbnail> {
        validate_thumbnail(thumbnail)?;

        sqlx::query(
            "INSERT INTO thumbnails (id, photo_id, size, width, height, mime, kind, uploaded_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(*thumbnail.id.as_uuid())
        .bind(*thumbnail.photo_id.as_uuid())
        .bind(thumbnail.size as i32)
        .bind(thumbnail.width as i16)
        .bind(thumbnail.height as i16)
        .bind(&thumbnail.mime)
        .bind(thumbnail.kind.as_str())
        .bind(thumbnail.uploaded_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(thumbnail.clone())
    }

    async fn find_all(&self) -> Result<Vec<Photo>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM photos ORDER BY uploaded_at DESC, id DESC",
            PHOTO_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(photo_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(db_err)
    }

    async fn find_photo(&self, id: PhotoId) -> Result<Option<Photo>> {
        let row = sqlx::query(&format!("SELECT {} FROM photos WHERE id = $1", PHOTO_COLUMNS))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(photo_from_row).transpose().map_err(db_err)
    }

    async fn find_thumbnail(&self, id: ThumbnailId) -> Result<Option<Thumbnail>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM thumbnails WHERE id = $1",
            THUMBNAIL_COLUMNS
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref()
            .map(thumbnail_from_row)
            .transpose()
            .map_err(db_err)
    }

    async fn find_thumbnails(&self, photo_id: PhotoId) -> Result<Vec<Thumbnail>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM thumbnails WHERE photo_id = $1
             ORDER BY CASE kind WHEN 'NORMAL' THEN 0 ELSE 1 END, id",
            THUMBNAIL_COLUMNS
        ))
        .bind(*photo_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.iter()
            .map(thumbnail_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(db_err)
    }

    async fn delete_photo(&self, id: PhotoId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM photos WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }
}
