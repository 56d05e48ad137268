//! Storage backends.
//!
//! Binary content and structured metadata live in two independent stores
//! that share no transaction. Each is reached through a trait so the
//! ingest pipeline and the HTTP layer can run against any backend.

pub mod content;
pub mod metadata;
pub mod postgres;
pub mod s3;

pub use content::{ContentStore, MemoryContentStore, StoredObject};
pub use metadata::{MetadataStore, SqliteMetadataStore};
pub use postgres::PostgresMetadataStore;
pub use s3::S3ContentStore;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::{Config, ContentBackend, DatabaseBackend};

/// Connect the content store selected by `config`.
pub async fn connect_content_store(config: &Config) -> Result<Arc<dyn ContentStore>> {
    match config.storage.backend {
        ContentBackend::S3 => {
            let settings = config.storage.s3_settings()?;
            tracing::info!(
                "Using S3 content store at {} (bucket {})",
                settings.endpoint,
                settings.bucket
            );
            Ok(Arc::new(S3ContentStore::new(&settings).await))
        }
        ContentBackend::Memory => {
            tracing::warn!("Using in-memory content store; uploads are lost on exit");
            Ok(Arc::new(MemoryContentStore::new()))
        }
    }
}

/// Connect the metadata store selected by `config`.
pub async fn connect_metadata_store(config: &Config) -> Result<Arc<dyn MetadataStore>> {
    match config.database.backend {
        DatabaseBackend::Postgres => {
            let pg = &config.database.postgres;
            tracing::info!(
                "Connecting to Postgres at {}:{}/{}",
                pg.host,
                pg.port,
                pg.database
            );
            let store = PostgresMetadataStore::connect(pg)
                .await
                .context("Failed to initialise Postgres metadata store")?;
            Ok(Arc::new(store))
        }
        DatabaseBackend::Sqlite => {
            let path = config.database.sqlite_path.to_string_lossy();
            tracing::info!("Opening SQLite metadata store at {}", path);
            let pool = photostore_db::pool::init_pool(&path)
                .context("Failed to initialise SQLite metadata store")?;
            Ok(Arc::new(SqliteMetadataStore::new(pool)))
        }
    }
}
