// Monte Carlo Infrastructure — N seeded runs with statistical aggregation
// Run i uses seed base_seed + i; each metric reports mean ± 95% CI

use anyhow::Context;
use roadlink_engine::scenario::random_scenario;
use roadlink_engine::{RunStats, ScenarioConfig};
use tracing::warn;

use crate::report::*;
use crate::time_series::TimeSeriesRecorder;

use std::path::Path;
use std::time::Instant;

/// Where each run's scenario comes from.
pub enum ScenarioSource {
    /// Fresh reference pools drawn from every run's seed.
    Random,
    /// Fixed pools from a file; only the seed changes between runs.
    File(ScenarioConfig),
}

impl ScenarioSource {
    fn scenario(&self, seed: u64) -> ScenarioConfig {
        match self {
            Self::Random => random_scenario(seed),
            Self::File(config) => ScenarioConfig { seed, ..config.clone() },
        }
    }
}

/// Run a single simulation with a specific seed.
pub fn run_single(
    source: &ScenarioSource,
    seed: u64,
    ticks: u64,
    time_series_dir: Option<&Path>,
) -> anyhow::Result<RunResult> {
    let start = Instant::now();
    let config = source.scenario(seed);
    let mut engine = config
        .build()
        .with_context(|| format!("building scenario for seed {}", seed))?;

    let mut time_series = time_series_dir.map(|_| TimeSeriesRecorder::new());
    for _ in 0..ticks {
        let result = engine.tick_core();
        if let Some(ref mut ts) = time_series {
            ts.record(&result);
        }
    }

    if let (Some(ts), Some(dir)) = (&time_series, time_series_dir) {
        let path = dir.join(format!("seed-{}.jsonl", seed));
        if let Err(e) = ts.write_jsonl(&path) {
            warn!(path = %path.display(), error = %e, "failed to write time series");
        }
    }

    let stats = RunStats::from_summary(&engine.summary(), engine.vehicles());
    Ok(RunResult {
        seed,
        ticks,
        elapsed_ms: start.elapsed().as_millis(),
        acceptance_rate: stats.acceptance_rate(),
        stats,
    })
}

/// Run Monte Carlo: N runs, aggregate stats.
pub fn run_monte_carlo(
    source: &ScenarioSource,
    n_runs: usize,
    base_seed: u64,
    ticks: u64,
    time_series_dir: Option<&Path>,
) -> anyhow::Result<MonteCarloReport> {
    let mut results = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        let seed = base_seed + i as u64;
        results.push(run_single(source, seed, ticks, time_series_dir)?);
    }
    Ok(aggregate(results))
}

fn metric(results: &[RunResult], f: impl Fn(&RunResult) -> f64) -> Stats {
    Stats::from_samples(&results.iter().map(f).collect::<Vec<_>>())
}

/// Aggregate individual runs into a MonteCarloReport.
fn aggregate(results: Vec<RunResult>) -> MonteCarloReport {
    MonteCarloReport {
        n_runs: results.len(),
        accepted: metric(&results, |r| r.stats.total_accepted as f64),
        refused: metric(&results, |r| r.stats.total_refused as f64),
        failures: metric(&results, |r| r.stats.total_failures as f64),
        out_of_range: metric(&results, |r| r.stats.total_out_of_range as f64),
        acceptance_rate: metric(&results, |r| r.acceptance_rate),
        mean_accepted_time: metric(&results, |r| r.stats.mean_accepted_time),
        privacy_accepted: metric(&results, |r| r.stats.privacy.accepted as f64),
        non_privacy_accepted: metric(&results, |r| r.stats.non_privacy.accepted as f64),
        privacy_intercepted: metric(&results, |r| r.stats.privacy.intercepted as f64),
        non_privacy_intercepted: metric(&results, |r| r.stats.non_privacy.intercepted as f64),
        detected_spies: metric(&results, |r| r.stats.detected_spies.len() as f64),
        completed: metric(&results, |r| r.stats.completed.len() as f64),
        elapsed_ms: metric(&results, |r| r.elapsed_ms as f64),
        individual_runs: results,
    }
}
