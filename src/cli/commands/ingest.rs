//! The `ingest` command.

use anyhow::Context;
use futures::stream::{self, StreamExt};

use docintake::{Config, IngestOutput, Ingestor, Reference};

use crate::cli::icons::error;

/// Ingest every reference and print results in argument order.
pub async fn cmd_ingest(
    mut config: Config,
    references: &[String],
    compact: bool,
    no_file_meta: bool,
    jobs: usize,
) -> anyhow::Result<()> {
    if no_file_meta {
        config.attach_file_meta = false;
    }

    let ingestor = Ingestor::new(config).context("Failed to initialize ingestion pipeline")?;
    let references: Vec<Reference> = references.iter().map(|r| Reference::parse(r)).collect();

    let outcomes: Vec<_> = stream::iter(references.iter().map(|r| ingestor.ingest(r)))
        .buffered(jobs.max(1))
        .collect()
        .await;

    let mut failures = 0;
    for (reference, outcome) in references.iter().zip(outcomes) {
        match outcome {
            Ok(output) => println!("{}", render(&output, compact)?),
            Err(e) => {
                failures += 1;
                eprintln!("{} {}: {}", error(), reference, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} references failed", failures, references.len());
    }
    Ok(())
}

fn render(output: &IngestOutput, compact: bool) -> serde_json::Result<String> {
    if compact {
        serde_json::to_string(output)
    } else {
        serde_json::to_string_pretty(output)
    }
}
