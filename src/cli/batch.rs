//! Batch command handler.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use mathchat::batch::{format_results, load_messages, run_batch, BatchOutputFormat};

use super::{build_engine, load_config, EngineArgs};

/// Resolve every message in `file` and print the results.
pub(crate) async fn cmd_batch(
    args: &EngineArgs,
    file: &Path,
    format: Option<BatchOutputFormat>,
    concurrency: Option<usize>,
) -> Result<()> {
    let config = load_config(args)?;

    let mut batch = config.batch.clone();
    if let Some(format) = format {
        batch.output_format = format;
    }
    if let Some(concurrency) = concurrency {
        anyhow::ensure!(concurrency > 0, "--concurrency must be at least 1");
        batch.concurrency = concurrency;
    }

    let messages = load_messages(file)
        .with_context(|| format!("Failed to load messages from {}", file.display()))?;
    let engine = Arc::new(build_engine(&config)?);

    eprintln!(
        "Resolving {} message(s) with concurrency {}",
        messages.len(),
        batch.concurrency
    );

    let results = run_batch(engine, messages, &batch).await;
    let failed = results.iter().filter(|r| r.error.is_some()).count();

    println!("{}", format_results(&results, &batch.output_format));

    if failed > 0 {
        eprintln!("{} of {} message(s) failed", failed, results.len());
    }
    Ok(())
}
