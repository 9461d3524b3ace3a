//! The `check` command.

use anyhow::Context;
use console::style;

use docintake::tools::required_tools;
use docintake::{Config, Ingestor};

use crate::cli::icons::{dim_arrow, error, success};

/// Report whether the OCR engine and external tools are available.
pub fn cmd_check(config: &Config) -> anyhow::Result<()> {
    let ingestor =
        Ingestor::new(config.clone()).context("Failed to initialize ingestion pipeline")?;
    let mut missing = 0;

    let ocr = ingestor.ocr_backend();
    if ocr.is_available() {
        eprintln!("{} {} {}", success(), style(ocr.name()).bold(), style(ocr.availability_hint()).dim());
    } else {
        missing += 1;
        eprintln!("{} {} unavailable", error(), style(ocr.name()).bold());
        eprintln!("  {} {}", dim_arrow(), ocr.availability_hint());
    }

    let yt_dlp = config.youtube.yt_dlp_path();
    let tools = required_tools(&yt_dlp.to_string_lossy());
    for tool in &tools {
        match tool.location() {
            Some(path) => eprintln!(
                "{} {} {}",
                success(),
                style(tool.name).bold(),
                style(path.display()).dim()
            ),
            None => {
                missing += 1;
                eprintln!("{} {} not found ({})", error(), style(tool.name).bold(), tool.purpose);
                eprintln!("  {} Install with: {}", dim_arrow(), tool.install_hint);
            }
        }
    }

    if missing > 0 {
        anyhow::bail!("{} of {} tools missing", missing, tools.len() + 1);
    }
    Ok(())
}
