//! shotprobe core - discovery pipeline for randomly addressed screenshot hosts.
//!
//! Screenshot hosts like prnt.sc address captures by short random
//! identifiers. This crate samples that identifier space, fetches whatever
//! lives behind each guess, and keeps the genuine images that (optionally)
//! contain some text of interest.
//!
//! # Architecture
//!
//! ```text
//! IdGenerator → Resolver → Validator → ContentFilter (OCR) → ImageSink
//!                         ╰──────── one unit of work ────────╯
//! Harvester: bounded pool of units, single-consumer statistics, stop at target
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shotprobe_core::{Config, ContentFilter, DiskSink, Harvester, HttpResolver, Prober,
//!                      RunOptions, Validator};
//!
//! #[tokio::main]
//! async fn main() -> shotprobe_core::Result<()> {
//!     let config = Config::load()?;
//!     let resolver = HttpResolver::new(&config.remote, &config.limits)?;
//!     let prober = Prober::new(
//!         Arc::new(resolver),
//!         Validator::new(config.limits.clone()),
//!         ContentFilter::disabled(),
//!         Arc::new(DiskSink::new("./captures")),
//!     );
//!     let report = Harvester::new(prober, RunOptions::from_config(&config.probe))
//!         .run(|_, _| {})
//!         .await?;
//!     println!("Saved {} capture(s)", report.stats.accepted);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod ocr;
pub mod output;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, Result, ShotprobeError};
pub use ocr::{TesseractEngine, TextRecognizer};
pub use output::{OutputFormat, OutputWriter, MANIFEST_FILE};
pub use pipeline::{
    parse_fragment_list, ContentFilter, DiskSink, FileDiscovery, FolderScanner, Harvester,
    HttpResolver, Prober, RunOptions, Validator,
};
pub use types::{Capture, ProbeOutcome, RunReport, RunStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
