//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod backends;
mod extract;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "pageocr")]
#[command(about = "Page-by-page OCR text extraction for PDFs and images")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a PDF or image, one result per page
    Extract {
        /// PDF or image file
        file: PathBuf,
        /// Source-language hint (e.g. eng, deu)
        #[arg(short, long)]
        language: Option<String>,
        /// Render scale over 72 DPI
        #[arg(short, long)]
        scale: Option<f32>,
        /// JPEG quality for rendered pages (1-100)
        #[arg(short, long)]
        quality: Option<u8>,
        /// OCR backend (tesseract, http)
        #[arg(short, long)]
        backend: Option<String>,
        /// Write the result record here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List OCR backends and whether they are usable
    Backends,

    /// Start the extraction HTTP server
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default from config)
        bind: Option<String>,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    match cli.command {
        Commands::Extract {
            file,
            language,
            scale,
            quality,
            backend,
            output,
            pretty,
        } => {
            let overrides = extract::ExtractOverrides {
                language,
                scale,
                quality,
                backend,
            };
            extract::cmd_extract(config, &file, overrides, output.as_deref(), pretty).await
        }
        Commands::Backends => backends::cmd_backends(&config).await,
        Commands::Serve { bind } => serve::cmd_serve(config, bind.as_deref()).await,
    }
}
