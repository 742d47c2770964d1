//! Batch scenario runner for balance sweeps.
//!
//! Runs many seeded sessions of one scenario in parallel with rayon and
//! aggregates the outcomes, so a balance change can be judged across a
//! seed range instead of a single anecdote.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use palisade_core::waves::GameOutcome;

use crate::runner::{run_scenario, RunReport};
use crate::scenario::{Scenario, ScenarioError};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario to run: a preset name or a RON file path.
    pub scenario: String,
    /// Number of runs.
    pub run_count: u32,
    /// Maximum parallel runs (0 = rayon default).
    pub parallel_runs: u32,
    /// Output directory for results.
    pub output_dir: PathBuf,
    /// First seed; run `i` uses `seed_start + i`.
    pub seed_start: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: "standard".to_string(),
            run_count: 100,
            parallel_runs: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario.
    pub fn new(scenario: &str, run_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            run_count,
            ..Default::default()
        }
    }

    /// Set output directory.
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }
}

/// Error during one run of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Run index within the batch.
    pub run_index: u32,
    /// Seed used.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs aggregated.
    pub total_runs: u32,
    /// Runs ending in victory.
    pub victories: u32,
    /// Runs ending in defeat.
    pub defeats: u32,
    /// Runs that hit the time budget.
    pub timeouts: u32,
    /// Victory fraction of all runs.
    pub victory_rate: f64,
    /// Average ticks per run.
    pub avg_ticks: f64,
    /// Shortest run.
    pub min_ticks: u64,
    /// Longest run.
    pub max_ticks: u64,
    /// Average waves cleared per run.
    pub avg_waves_cleared: f64,
    /// Average enemies destroyed per run.
    pub avg_enemies_destroyed: f64,
    /// Average final token balance.
    pub avg_tokens_final: f64,
}

impl BatchSummary {
    /// Aggregate a list of run reports.
    #[must_use]
    pub fn from_runs(runs: &[RunReport]) -> Self {
        if runs.is_empty() {
            return Self::default();
        }

        let mut summary = Self {
            total_runs: runs.len() as u32,
            min_ticks: u64::MAX,
            ..Default::default()
        };
        let mut ticks_sum = 0u64;
        let mut waves_sum = 0u64;
        let mut enemies_sum = 0u64;
        let mut tokens_sum = 0u64;

        for run in runs {
            match run.outcome {
                Some(GameOutcome::Victory) => summary.victories += 1,
                Some(GameOutcome::Defeat) => summary.defeats += 1,
                None => summary.timeouts += 1,
            }
            ticks_sum += run.ticks;
            summary.min_ticks = summary.min_ticks.min(run.ticks);
            summary.max_ticks = summary.max_ticks.max(run.ticks);
            waves_sum += u64::from(run.waves_cleared);
            enemies_sum += u64::from(run.enemies_destroyed);
            tokens_sum += u64::from(run.tokens_final);
        }

        let n = f64::from(summary.total_runs);
        summary.victory_rate = f64::from(summary.victories) / n;
        summary.avg_ticks = ticks_sum as f64 / n;
        summary.avg_waves_cleared = waves_sum as f64 / n;
        summary.avg_enemies_destroyed = enemies_sum as f64 / n;
        summary.avg_tokens_final = tokens_sum as f64 / n;
        summary
    }
}

/// Results of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual run reports, in seed order.
    pub runs: Vec<RunReport>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total wall-clock runtime.
    pub duration_seconds: f64,
    /// Runs that failed.
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of seeded sessions.
///
/// The scenario resolves once up front, so a bad name or file fails the
/// whole batch instead of every run individually.
pub fn run_batch(config: BatchConfig) -> Result<BatchResults, ScenarioError> {
    let scenario = Scenario::resolve(&config.scenario)?;
    let start = Instant::now();

    tracing::info!(
        scenario = %scenario.name,
        runs = config.run_count,
        seed_start = config.seed_start,
        "starting batch"
    );

    if config.parallel_runs > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_runs as usize)
            .build_global()
            .ok(); // Ignore if a pool already exists
    }

    let completed = Arc::new(AtomicU32::new(0));
    let results: Vec<Result<RunReport, BatchError>> = (0..config.run_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let outcome = run_scenario(&scenario, seed).map_err(|e| BatchError {
                run_index: i,
                seed,
                message: e.to_string(),
            });
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 10 == 0 {
                tracing::debug!(done, total = config.run_count, "batch progress");
            }
            outcome
        })
        .collect();

    let (runs, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let runs: Vec<RunReport> = runs.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_runs(&runs);
    let duration_seconds = start.elapsed().as_secs_f64();

    tracing::info!(
        runs = runs.len(),
        failures = errors.len(),
        victory_rate = summary.victory_rate,
        duration_seconds,
        "batch complete"
    );

    Ok(BatchResults {
        config,
        runs,
        summary,
        duration_seconds,
        errors,
    })
}

/// Run the same seed several times and check every report matches.
pub fn verify_determinism(
    scenario_name: &str,
    seed: u64,
    runs: u32,
) -> Result<bool, ScenarioError> {
    let scenario = Scenario::resolve(scenario_name)?;
    let mut first: Option<RunReport> = None;
    for _ in 0..runs {
        let report = run_scenario(&scenario, seed)?;
        match &first {
            None => first = Some(report),
            Some(reference) => {
                if report != *reference {
                    tracing::warn!(
                        seed,
                        expected = reference.final_state_hash,
                        got = report.final_state_hash,
                        "determinism check failed"
                    );
                    return Ok(false);
                }
            }
        }
    }
    Ok(true)
}
