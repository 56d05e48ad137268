mod cli;

use photostore::{
    config,
    ingest::Ingestor,
    server::{self, AppContext},
    store,
};

use anyhow::{Context, Result};
use bytes::Bytes;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;

async fn serve(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load(config_path)?;

    // CLI flags win over file and environment
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting photostore server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );

    let content = store::connect_content_store(&config).await?;
    let metadata = store::connect_metadata_store(&config).await?;

    let ctx = AppContext::new(config, content, metadata);
    server::start_server(ctx).await
}

async fn ingest_file(
    file: &Path,
    mime: Option<String>,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load(config_path)?;

    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let data = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {:?}", file))?;
    let declared_size = data.len() as u64;

    let declared_mime = match mime {
        Some(m) => m,
        None => photostore_media::probe(&data)
            .map(|p| p.mime)
            .unwrap_or_else(|_| "application/octet-stream".to_string()),
    };

    tracing::info!("Ingesting {:?} as {}", file, declared_mime);

    let content = store::connect_content_store(&config).await?;
    let metadata = store::connect_metadata_store(&config).await?;
    let ingestor = Ingestor::new(content, metadata, config.derivation.variants.clone());

    match ingestor
        .ingest(Bytes::from(data), &declared_mime, declared_size)
        .await
    {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            if let Some(ref log) = e.commit_log {
                eprintln!("{}", serde_json::to_string_pretty(log)?);
            }
            Err(e.into())
        }
    }
}

fn check_config(path: Option<&Path>) -> Result<()> {
    let config = config::load(path)?;

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Signed URL TTL: {}s", config.server.url_ttl_secs);
    println!("  Max upload: {} bytes", config.server.max_upload_bytes);
    println!("  Content backend: {:?}", config.storage.backend);
    if config.storage.backend == config::ContentBackend::S3 {
        println!("    {:?}", config.storage.s3_settings()?);
    }
    println!("  Metadata backend: {:?}", config.database.backend);
    match config.database.backend {
        config::DatabaseBackend::Postgres => {
            println!("    {:?}", config.database.postgres);
        }
        config::DatabaseBackend::Sqlite => {
            println!("    Path: {}", config.database.sqlite_path.display());
        }
    }
    println!("  Thumbnail variants: {}", config.derivation.variants.len());
    for variant in &config.derivation.variants {
        println!(
            "    {} {}x{} {}{}",
            variant.kind,
            variant.max_width,
            variant.max_height,
            variant.format.as_str(),
            variant
                .filter
                .map(|f| format!(" {:?}", f))
                .unwrap_or_default()
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "photostore=trace,photostore_media=trace,photostore_db=debug,photostore_common=debug,tower_http=debug".to_string()
        } else {
            "photostore=debug,photostore_media=debug,photostore_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Serve { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve(host, port, cli.config.as_deref()))
        }
        Commands::Ingest { file, mime } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(ingest_file(&file, mime, cli.config.as_deref()))
        }
        Commands::CheckConfig => check_config(cli.config.as_deref()),
        Commands::Version => {
            println!("photostore {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
