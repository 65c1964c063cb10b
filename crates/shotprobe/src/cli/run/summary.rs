//! Progress bar and end-of-run summary.

use console::Style;
use shotprobe_core::RunReport;
use std::path::Path;

/// Progress bar over accepted captures.
pub fn create_progress_bar(target: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(target);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} saved {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb.set_message("starting...");
    pb
}

/// Print the summary table to stderr.
pub fn print_summary(report: &RunReport, run_dir: &Path) {
    let stats = &report.stats;
    let dim = Style::new().for_stderr().dim();
    let status = if report.target_reached() {
        Style::new().for_stderr().green()
    } else {
        Style::new().for_stderr().yellow()
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Attempts:     {:>8}", stats.attempts);
    eprintln!(
        "    Saved:        {}",
        status.apply_to(format!("{:>8}", format!("{}/{}", stats.accepted, report.target)))
    );
    eprintln!("  ------------------------------------");
    eprintln!("    Not found:    {:>8}", stats.rejected_not_found);
    if stats.rejected_filter_mismatch > 0 {
        eprintln!("    No match:     {:>8}", stats.rejected_filter_mismatch);
    }
    eprintln!("    Other:        {:>8}", stats.rejected_other);
    if stats.persist_failed > 0 {
        eprintln!("    Write failed: {:>8}", stats.persist_failed);
    }
    if stats.surplus > 0 {
        eprintln!("    Surplus:      {:>8}", stats.surplus);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Failure rate: {:>7.1}%", stats.failure_rate());
    eprintln!("    Duration:     {:>7.1}s", stats.total_seconds);
    eprintln!("    Rate:         {:>7.1} ids/sec", stats.attempts_per_second());
    eprintln!("  ====================================");
    eprintln!("    {}", dim.apply_to(run_dir.display()));
}
