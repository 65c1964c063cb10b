//! The `shotprobe run` command: probe until enough captures are saved.

mod setup;
mod summary;

use clap::Args;
use shotprobe_core::{Config, OutputWriter, ProbeOutcome, MANIFEST_FILE};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use setup::setup_harvester;
use summary::{create_progress_bar, print_summary};

/// Arguments for the `run` command.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Captures to save before stopping [default: 10, or `probe.target` from config]
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Comma-separated words; only captures whose text contains one are kept
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Concurrent probes [default: 8, or `probe.workers` from config]
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Save into this directory instead of a new timestamped one
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Give up after this many identifiers even if the count was not reached
    #[arg(long)]
    pub max_attempts: Option<u64>,

    /// Seed for a reproducible identifier sequence
    #[arg(long)]
    pub seed: Option<u64>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Execute the run command.
pub async fn execute(args: RunArgs, config: Config) -> anyhow::Result<()> {
    let ctx = setup_harvester(&args, config).await?;
    let target = ctx.harvester.options().target as u64;

    tracing::info!("Saving captures to {}", ctx.run_dir.display());
    if !ctx.fragments.is_empty() {
        tracing::info!("Keeping captures containing: {}", ctx.fragments.join(", "));
    }

    let progress = if args.no_progress {
        indicatif::ProgressBar::hidden()
    } else {
        create_progress_bar(target)
    };

    // Opened on the first capture so an empty run leaves no manifest behind.
    let mut manifest: Option<OutputWriter<BufWriter<File>>> = None;
    let start = Instant::now();

    let report = ctx
        .harvester
        .run(|outcome, stats| {
            tracing::debug!("{} -> {}", outcome.id(), outcome.label());
            if let ProbeOutcome::Accepted(capture) = outcome {
                progress.set_position(stats.accepted);
                if manifest.is_none() {
                    match OutputWriter::manifest(&ctx.run_dir) {
                        Ok(writer) => manifest = Some(writer),
                        Err(e) => tracing::error!("Cannot open {MANIFEST_FILE}: {e}"),
                    }
                }
                if let Some(writer) = manifest.as_mut() {
                    if let Err(e) = writer.write(capture.as_ref()) {
                        tracing::error!("Failed to record {} in {MANIFEST_FILE}: {e}", capture.id);
                    }
                }
            }

            let elapsed = start.elapsed().as_secs_f64();
            if elapsed > 0.0 {
                progress.set_message(format!(
                    "{} tried, {:.1}/sec",
                    stats.attempts,
                    stats.attempts as f64 / elapsed
                ));
            }
        })
        .await?;

    if let Some(writer) = manifest.as_mut() {
        writer.flush()?;
    }
    progress.finish_and_clear();

    print_summary(&report, &ctx.run_dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_args_default_leaves_config_in_charge() {
        let args = RunArgs::default();
        assert!(args.count.is_none());
        assert!(args.workers.is_none());
        assert!(args.filter.is_none());
        assert!(args.output_dir.is_none());
        assert!(!args.no_progress);
    }
}
