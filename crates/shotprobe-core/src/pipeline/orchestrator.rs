//! Run orchestration: bounded worker pool, stopping rule, statistics.
//!
//! Units of work run concurrently on a [`JoinSet`], but their outcomes are
//! consumed one at a time by a single coordinating loop. That loop is the only
//! place statistics change and the only place the stopping decision is made.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;

use crate::config::ProbeConfig;
use crate::error::PipelineError;
use crate::types::{ProbeOutcome, RunReport, RunStats};

use super::identifier::IdGenerator;
use super::probe::{AcceptGate, Prober};

/// Immutable parameters of one run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Accepted captures that end the run
    pub target: usize,
    /// Maximum units of work in flight
    pub workers: usize,
    /// Identifier length
    pub id_length: usize,
    /// Stop dispatching after this many identifiers (unbounded when unset)
    pub max_attempts: Option<u64>,
    /// Seed for reproducible identifier sequences
    pub seed: Option<u64>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::from_config(&ProbeConfig::default())
    }
}

impl RunOptions {
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self {
            target: config.target,
            workers: config.workers,
            id_length: config.id_length,
            max_attempts: config.max_attempts,
            seed: config.seed,
        }
    }

    /// Reject options that make a run meaningless before anything starts.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.target == 0 {
            return Err(PipelineError::InvalidRun("target must be > 0".into()));
        }
        if self.workers == 0 {
            return Err(PipelineError::InvalidRun("workers must be > 0".into()));
        }
        if self.id_length == 0 {
            return Err(PipelineError::InvalidRun("id_length must be > 0".into()));
        }
        if self.max_attempts == Some(0) {
            return Err(PipelineError::InvalidRun(
                "max_attempts must be > 0 when set".into(),
            ));
        }
        Ok(())
    }
}

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Dispatching new identifiers while below target
    Running,
    /// Target met (or attempts exhausted); waiting for in-flight work
    Draining,
    /// Everything dispatched has completed
    Done,
}

/// Drives probes until the target number of captures is saved.
pub struct Harvester {
    prober: Arc<Prober>,
    options: RunOptions,
}

impl Harvester {
    pub fn new(prober: Prober, options: RunOptions) -> Self {
        Self {
            prober: Arc::new(prober),
            options,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run to completion.
    ///
    /// `on_outcome` is called from the coordinating loop after each completed
    /// unit of work, with the statistics already updated. Only invalid options
    /// produce an error; every per-identifier failure is counted instead.
    pub async fn run<F>(&self, mut on_outcome: F) -> Result<RunReport, PipelineError>
    where
        F: FnMut(&ProbeOutcome, &RunStats),
    {
        self.options.validate()?;

        let start = Instant::now();
        let target = self.options.target;
        let gate = Arc::new(AcceptGate::new(target));
        let mut ids = IdGenerator::with_optional_seed(self.options.id_length, self.options.seed);
        let mut in_flight: JoinSet<ProbeOutcome> = JoinSet::new();
        let mut stats = RunStats::default();
        let mut captures = Vec::new();
        let mut dispatched: u64 = 0;
        let mut phase = RunPhase::Running;

        tracing::info!(
            "Probing for {} capture(s) with {} worker(s)",
            target,
            self.options.workers
        );

        loop {
            if phase == RunPhase::Running {
                while in_flight.len() < self.options.workers && self.attempts_left(dispatched) {
                    let id = ids.next_id();
                    let prober = self.prober.clone();
                    let gate = gate.clone();
                    in_flight.spawn(async move { prober.probe(id, &gate).await });
                    dispatched += 1;
                }
                if !self.attempts_left(dispatched) {
                    tracing::debug!("Dispatched all {dispatched} permitted identifier(s); draining");
                    phase = RunPhase::Draining;
                }
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            match joined {
                Ok(outcome) => {
                    stats.record(&outcome);
                    on_outcome(&outcome, &stats);
                    if let ProbeOutcome::Accepted(capture) = outcome {
                        captures.push(*capture);
                    }
                }
                Err(e) => {
                    tracing::error!("Probe task failed: {e}");
                    stats.record_lost();
                }
            }

            if phase == RunPhase::Running && stats.accepted >= target as u64 {
                tracing::info!(
                    "Target of {target} reached; draining {} in-flight probe(s)",
                    in_flight.len()
                );
                phase = RunPhase::Draining;
            }
        }

        phase = RunPhase::Done;
        stats.set_elapsed(start.elapsed());
        if self.stopped_short(&stats) {
            tracing::warn!(
                "Reached max attempts ({}) with {}/{} captures",
                stats.attempts,
                stats.accepted,
                target
            );
        }
        tracing::debug!(
            "Run {:?} after {} attempt(s) in {:.1}s",
            phase,
            stats.attempts,
            stats.total_seconds
        );

        Ok(RunReport {
            stats,
            captures,
            target: target as u64,
        })
    }

    /// Attempts ran out before the target was met.
    fn stopped_short(&self, stats: &RunStats) -> bool {
        self.options.max_attempts.is_some() && stats.accepted < self.options.target as u64
    }

    fn attempts_left(&self, dispatched: u64) -> bool {
        self.options
            .max_attempts
            .map_or(true, |max| dispatched < max)
    }
}
