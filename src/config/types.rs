use photostore_common::ThumbnailKind;
use photostore_media::{DerivationSpec, Filter, FitMode, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub derivation: DerivationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Lifetime of signed read URLs, in seconds.
    #[serde(default = "default_url_ttl")]
    pub url_ttl_secs: u64,

    /// Largest accepted request body.
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,

    /// Directory for upload spool files (system temp dir if unset).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    4000
}
fn default_url_ttl() -> u64 {
    3600
}
fn default_max_upload() -> usize {
    100 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            url_ttl_secs: default_url_ttl(),
            max_upload_bytes: default_max_upload(),
            temp_dir: None,
        }
    }
}

/// Where binary content is kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentBackend {
    #[default]
    S3,
    /// In-process map; content is lost on exit.
    Memory,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: ContentBackend,

    /// S3 endpoint host or URL (`S3_ENDPOINT`).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access key id (`S3_KEY_ID`).
    #[serde(default)]
    pub key_id: Option<String>,

    /// Secret access key (`S3_ACCESS_KEY`).
    #[serde(default)]
    pub access_key: Option<String>,

    /// Bucket holding `photos/` and `thumbnails/` (`S3_BUCKET`).
    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_true")]
    pub force_path_style: bool,
}

fn default_region() -> String {
    "us-east-1".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: ContentBackend::default(),
            endpoint: None,
            key_id: None,
            access_key: None,
            bucket: None,
            region: default_region(),
            force_path_style: true,
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("endpoint", &self.endpoint)
            .field("key_id", &self.key_id)
            .field("access_key", &self.access_key.as_ref().map(|_| "[REDACTED]"))
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Fully resolved S3 connection parameters.
#[derive(Clone)]
pub struct S3Settings {
    pub endpoint: String,
    pub key_id: String,
    pub access_key: String,
    pub bucket: String,
    pub region: String,
    pub force_path_style: bool,
}

impl std::fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Settings")
            .field("endpoint", &self.endpoint)
            .field("key_id", &self.key_id)
            .field("access_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

impl std::str::FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(format!("Unknown database backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,

    #[serde(default)]
    pub postgres: PostgresConfig,

    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: PathBuf,
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("photostore.sqlite")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            postgres: PostgresConfig::default(),
            sqlite_path: default_sqlite_path(),
        }
    }
}

#[derive(Clone, Deserialize, Serialize)]
pub struct PostgresConfig {
    #[serde(default = "default_pg_host")]
    pub host: String,

    #[serde(default = "default_pg_port")]
    pub port: u16,

    #[serde(default = "default_pg_database")]
    pub database: String,

    #[serde(default = "default_pg_username")]
    pub username: String,

    #[serde(default)]
    pub password: Option<String>,

    #[serde(default = "default_pg_max_connections")]
    pub max_connections: u32,
}

fn default_pg_host() -> String {
    "localhost".to_string()
}
fn default_pg_port() -> u16 {
    5432
}
fn default_pg_database() -> String {
    "photos".to_string()
}
fn default_pg_username() -> String {
    "postgres".to_string()
}
fn default_pg_max_connections() -> u32 {
    10
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: default_pg_host(),
            port: default_pg_port(),
            database: default_pg_database(),
            username: default_pg_username(),
            password: None,
            max_connections: default_pg_max_connections(),
        }
    }
}

impl std::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DerivationConfig {
    #[serde(default = "default_variants")]
    pub variants: Vec<ThumbnailVariant>,
}

impl Default for DerivationConfig {
    fn default() -> Self {
        Self {
            variants: default_variants(),
        }
    }
}

/// A thumbnail produced for every ingested photo.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThumbnailVariant {
    pub kind: ThumbnailKind,

    pub max_width: u32,

    pub max_height: u32,

    #[serde(default)]
    pub fit: FitMode,

    #[serde(default)]
    pub filter: Option<Filter>,

    #[serde(default)]
    pub format: OutputFormat,
}

impl ThumbnailVariant {
    pub fn spec(&self) -> DerivationSpec {
        DerivationSpec {
            max_width: self.max_width,
            max_height: self.max_height,
            fit: self.fit,
            filter: self.filter,
            format: self.format,
        }
    }
}

/// NORMAL (500x500 inside) and BLUR (500x500 inside, radius 10), both PNG.
pub fn default_variants() -> Vec<ThumbnailVariant> {
    vec![
        ThumbnailVariant {
            kind: ThumbnailKind::Normal,
            max_width: 500,
            max_height: 500,
            fit: FitMode::Inside,
            filter: None,
            format: OutputFormat::Png,
        },
        ThumbnailVariant {
            kind: ThumbnailKind::Blur,
            max_width: 500,
            max_height: 500,
            fit: FitMode::Inside,
            filter: Some(Filter::Blur { radius: 10.0 }),
            format: OutputFormat::Png,
        },
    ]
}
