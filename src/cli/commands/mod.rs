//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod config_cmd;
mod ingest;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use docintake::Config;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Extract confidence-scored text from documents, archives and URLs")]
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
    /// Ingest files, archives or URLs and print one JSON document per reference
    Ingest {
        /// File paths or http(s) URLs
        #[arg(required = true)]
        references: Vec<String>,
        /// Print single-line JSON
        #[arg(long)]
        compact: bool,
        /// Do not attach file metadata
        #[arg(long)]
        no_file_meta: bool,
        /// References processed at the same time
        #[arg(short = 'j', long, default_value = "4")]
        jobs: usize,
    },

    /// Check that the external tools are installed
    Check,

    /// Print the effective configuration as TOML
    Config,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Config::load_from_path(&path)
                .await
                .map_err(|e| anyhow::anyhow!(e))?
        }
        None => Config::load().await,
    };

    match cli.command {
        Commands::Ingest {
            references,
            compact,
            no_file_meta,
            jobs,
        } => ingest::cmd_ingest(config, &references, compact, no_file_meta, jobs).await,
        Commands::Check => check::cmd_check(&config),
        Commands::Config => config_cmd::cmd_config_show(&config),
    }
}
