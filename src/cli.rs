use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photostore")]
#[command(author, version, about = "Photo upload service with thumbnail derivation")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ingest a single image file and print the stored records as JSON
    Ingest {
        /// Image file to ingest
        #[arg(required = true)]
        file: PathBuf,

        /// Declared MIME type (detected from the file if omitted)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Load and validate configuration, then print a summary
    CheckConfig,

    /// Display version information
    Version,
}
