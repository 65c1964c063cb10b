//! Core data types for the shotprobe pipeline.
//!
//! A unit of work ends in exactly one [`ProbeOutcome`]; the coordinator folds
//! outcomes into [`RunStats`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// A capture that passed every stage and was written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capture {
    /// The probed identifier
    pub id: String,

    /// Page that was looked up
    pub page_url: String,

    /// Where the image bytes came from
    pub image_url: String,

    /// File name inside the run directory
    pub file_name: String,

    /// Full path of the written file
    pub saved_path: PathBuf,

    /// Detected format ("png", "jpeg", ...)
    pub format: String,

    /// Image width in pixels
    pub width: u32,

    /// Image height in pixels
    pub height: u32,

    /// Payload size in bytes
    pub file_size: u64,

    /// Fragment that satisfied the text filter, if one was configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_fragment: Option<String>,
}

/// Terminal result of one unit of work.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// Image found, valid, matched and saved
    Accepted(Box<Capture>),
    /// No capture behind the identifier (missing page, no image, placeholder)
    RejectedNotFound { id: String },
    /// Payload was not a genuine image
    RejectedInvalidImage { id: String, reason: String },
    /// Recognized text contained none of the fragments
    RejectedFilterMismatch { id: String },
    /// OCR engine failed on the image
    RejectedRecognition { id: String, reason: String },
    /// Network failure during lookup or fetch
    RejectedTransportError { id: String, cause: String },
    /// Writing the accepted image failed
    RejectedPersist { id: String, reason: String },
    /// Passed every check after the target had already been claimed
    RejectedSurplus { id: String },
}

impl ProbeOutcome {
    /// The identifier this outcome belongs to.
    pub fn id(&self) -> &str {
        match self {
            ProbeOutcome::Accepted(capture) => &capture.id,
            ProbeOutcome::RejectedNotFound { id }
            | ProbeOutcome::RejectedInvalidImage { id, .. }
            | ProbeOutcome::RejectedFilterMismatch { id }
            | ProbeOutcome::RejectedRecognition { id, .. }
            | ProbeOutcome::RejectedTransportError { id, .. }
            | ProbeOutcome::RejectedPersist { id, .. }
            | ProbeOutcome::RejectedSurplus { id } => id,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ProbeOutcome::Accepted(_))
    }

    /// Short label for logs and progress messages.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeOutcome::Accepted(_) => "accepted",
            ProbeOutcome::RejectedNotFound { .. } => "not-found",
            ProbeOutcome::RejectedInvalidImage { .. } => "invalid-image",
            ProbeOutcome::RejectedFilterMismatch { .. } => "filter-mismatch",
            ProbeOutcome::RejectedRecognition { .. } => "recognition-failed",
            ProbeOutcome::RejectedTransportError { .. } => "transport-error",
            ProbeOutcome::RejectedPersist { .. } => "persist-failed",
            ProbeOutcome::RejectedSurplus { .. } => "surplus",
        }
    }
}

/// Counters for one run.
///
/// Only the coordinating loop mutates these; workers never touch them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Completed units of work
    pub attempts: u64,

    /// Captures saved
    pub accepted: u64,

    /// Identifiers with nothing behind them
    pub rejected_not_found: u64,

    /// Images whose text matched none of the fragments
    pub rejected_filter_mismatch: u64,

    /// Transport, invalid image and recognition failures
    pub rejected_other: u64,

    /// Write failures (kept apart from `rejected_other`)
    pub persist_failed: u64,

    /// Matches that completed after the target was already claimed
    pub surplus: u64,

    /// Wall-clock time of the run in seconds
    pub total_seconds: f64,
}

impl RunStats {
    /// Fold one outcome into the counters. Each call bumps `attempts` and
    /// exactly one other counter.
    pub fn record(&mut self, outcome: &ProbeOutcome) {
        self.attempts += 1;
        match outcome {
            ProbeOutcome::Accepted(_) => self.accepted += 1,
            ProbeOutcome::RejectedNotFound { .. } => self.rejected_not_found += 1,
            ProbeOutcome::RejectedFilterMismatch { .. } => self.rejected_filter_mismatch += 1,
            ProbeOutcome::RejectedInvalidImage { .. }
            | ProbeOutcome::RejectedRecognition { .. }
            | ProbeOutcome::RejectedTransportError { .. } => self.rejected_other += 1,
            ProbeOutcome::RejectedPersist { .. } => self.persist_failed += 1,
            ProbeOutcome::RejectedSurplus { .. } => self.surplus += 1,
        }
    }

    /// Count a unit of work that died without producing an outcome.
    pub fn record_lost(&mut self) {
        self.attempts += 1;
        self.rejected_other += 1;
    }

    /// Sum of every non-accepted counter.
    pub fn rejected(&self) -> u64 {
        self.rejected_not_found
            + self.rejected_filter_mismatch
            + self.rejected_other
            + self.persist_failed
            + self.surplus
    }

    /// Percentage of attempts that did not end in a saved capture.
    pub fn failure_rate(&self) -> f64 {
        if self.attempts == 0 {
            return 0.0;
        }
        self.rejected() as f64 * 100.0 / self.attempts as f64
    }

    /// Attempts per second over the whole run.
    pub fn attempts_per_second(&self) -> f64 {
        if self.total_seconds > 0.0 {
            self.attempts as f64 / self.total_seconds
        } else {
            0.0
        }
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.total_seconds = elapsed.as_secs_f64();
    }
}

/// Final report of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Counters at `Done`
    pub stats: RunStats,

    /// Every capture saved during the run, in completion order
    pub captures: Vec<Capture>,

    /// The target the run was asked to reach
    pub target: u64,
}

impl RunReport {
    /// Whether the run stopped because it reached its target (as opposed to
    /// exhausting `max_attempts`).
    pub fn target_reached(&self) -> bool {
        self.stats.accepted >= self.target
    }
}
