mod types;

pub use types::*;

use anyhow::{Context, Result};
use photostore_common::Error;
use std::collections::HashSet;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    Ok(config)
}

/// Load config from the given path, the default locations, or defaults
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./photostore.toml",
        "~/.config/photostore/config.toml",
        "/etc/photostore/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Resolve the effective configuration: file (or defaults), then `.env`
/// and process environment overrides, then validation.
pub fn load(custom_path: Option<&Path>) -> Result<Config> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {:?}", path),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("Failed to load .env file: {}", e),
    }

    let mut config = load_config_or_default(custom_path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` returns the value of a variable; empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = var("HOST") {
        config.server.host = v;
    }
    if let Some(v) = var("PORT") {
        config.server.port = parse_var("PORT", &v)?;
    }

    if let Some(v) = var("STORAGE_BACKEND") {
        config.storage.backend = match v.to_ascii_lowercase().as_str() {
            "s3" => ContentBackend::S3,
            "memory" => ContentBackend::Memory,
            other => {
                return Err(Error::configuration(format!(
                    "Invalid STORAGE_BACKEND: {}",
                    other
                ))
                .into())
            }
        };
    }
    if let Some(v) = var("S3_ENDPOINT") {
        config.storage.endpoint = Some(v);
    }
    if let Some(v) = var("S3_KEY_ID") {
        config.storage.key_id = Some(v);
    }
    if let Some(v) = var("S3_ACCESS_KEY") {
        config.storage.access_key = Some(v);
    }
    if let Some(v) = var("S3_BUCKET") {
        config.storage.bucket = Some(v);
    }
    if let Some(v) = var("S3_REGION") {
        config.storage.region = v;
    }
    if let Some(v) = var("S3_FORCE_PATH_STYLE") {
        config.storage.force_path_style = parse_bool("S3_FORCE_PATH_STYLE", &v)?;
    }

    if let Some(v) = var("DATABASE_BACKEND") {
        config.database.backend = v
            .parse()
            .map_err(|e: String| Error::configuration(format!("Invalid DATABASE_BACKEND: {}", e)))?;
    }
    if let Some(v) = var("SQLITE_PATH") {
        config.database.sqlite_path = v.into();
    }

    let pg = &mut config.database.postgres;
    if let Some(v) = var("PG_HOST") {
        pg.host = v;
    }
    if let Some(v) = var("PG_PORT") {
        pg.port = parse_var("PG_PORT", &v)?;
    }
    if let Some(v) = var("PG_DATABASE") {
        pg.database = v;
    }
    if let Some(v) = var("PG_USERNAME") {
        pg.username = v;
    }
    if let Some(v) = var("PG_PASSWORD") {
        pg.password = Some(v);
    }

    Ok(())
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::configuration(format!("Invalid {}: {}", key, value)).into())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::configuration(format!("Invalid {}: {}", key, value)).into()),
    }
}

impl StorageConfig {
    /// Resolve the S3 connection parameters.
    ///
    /// Endpoints given without a scheme are assumed to be HTTPS.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] naming the first missing variable.
    pub fn s3_settings(&self) -> std::result::Result<S3Settings, Error> {
        fn require(value: &Option<String>, var: &str) -> std::result::Result<String, Error> {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or_else(|| Error::configuration(format!("Missing var {}", var)))
        }

        let endpoint = require(&self.endpoint, "S3_ENDPOINT")?;
        let endpoint = if endpoint.contains("://") {
            endpoint
        } else {
            format!("https://{}", endpoint)
        };

        Ok(S3Settings {
            endpoint,
            key_id: require(&self.key_id, "S3_KEY_ID")?,
            access_key: require(&self.access_key, "S3_ACCESS_KEY")?,
            bucket: require(&self.bucket, "S3_BUCKET")?,
            region: self.region.clone(),
            force_path_style: self.force_path_style,
        })
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.server.url_ttl_secs == 0 || config.server.url_ttl_secs > 7 * 24 * 3600 {
        anyhow::bail!(
            "server.url_ttl_secs must be between 1 and 604800, got {}",
            config.server.url_ttl_secs
        );
    }

    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes cannot be 0");
    }

    if config.storage.backend == ContentBackend::S3 {
        config.storage.s3_settings()?;
    }

    if config.database.backend == DatabaseBackend::Postgres
        && config.database.postgres.max_connections == 0
    {
        anyhow::bail!("database.postgres.max_connections cannot be 0");
    }

    validate_variants(&config.derivation.variants)
}

fn validate_variants(variants: &[ThumbnailVariant]) -> Result<()> {
    if variants.is_empty() {
        anyhow::bail!("derivation.variants must not be empty");
    }

    let mut seen = HashSet::new();
    for variant in variants {
        if !seen.insert(variant.kind) {
            anyhow::bail!("Duplicate thumbnail variant: {}", variant.kind);
        }
        if variant.max_width == 0 || variant.max_height == 0 {
            anyhow::bail!("Variant {} has a zero bound", variant.kind);
        }
        if let Some(photostore_media::Filter::Blur { radius }) = variant.filter {
            if !(radius > 0.0) {
                anyhow::bail!("Variant {} blur radius must be positive", variant.kind);
            }
        }
    }

    Ok(())
}
