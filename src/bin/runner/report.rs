// Runner Report Types
// Structured output for independent analysis of connectivity and privacy runs

use roadlink_engine::RunStats;
use serde::Serialize;

// ─── Statistics (per-metric Monte Carlo aggregation) ────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub min: f64,
    pub max: f64,
    pub n: usize,
}

impl Stats {
    pub fn from_samples(samples: &[f64]) -> Self {
        let n = samples.len();
        if n == 0 {
            return Self { mean: 0.0, std_dev: 0.0, ci_lower: 0.0, ci_upper: 0.0, min: 0.0, max: 0.0, n: 0 };
        }
        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = if n > 1 {
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64
        } else {
            0.0
        };
        let std_dev = variance.sqrt();
        let stderr = std_dev / (n as f64).sqrt();
        let z = 1.96; // 95% CI
        Self {
            mean,
            std_dev,
            ci_lower: mean - z * stderr,
            ci_upper: mean + z * stderr,
            min: samples.iter().cloned().fold(f64::INFINITY, f64::min),
            max: samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            n,
        }
    }
}

// ─── Single-Run Result ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub seed: u64,
    pub ticks: u64,
    pub elapsed_ms: u128,
    pub acceptance_rate: f64,
    pub stats: RunStats,
}

// ─── Monte Carlo Report (aggregation over seeds) ────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub n_runs: usize,
    pub accepted: Stats,
    pub refused: Stats,
    pub failures: Stats,
    pub out_of_range: Stats,
    pub acceptance_rate: Stats,
    pub mean_accepted_time: Stats,
    pub privacy_accepted: Stats,
    pub non_privacy_accepted: Stats,
    pub privacy_intercepted: Stats,
    pub non_privacy_intercepted: Stats,
    pub detected_spies: Stats,
    pub completed: Stats,
    pub elapsed_ms: Stats,
    pub individual_runs: Vec<RunResult>,
}

// ─── Top-Level Report ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub timestamp: String,
    pub version: &'static str,
    pub prng: &'static str,
    pub scenario_source: String,
    pub ticks: u64,
    pub base_seed: u64,
    pub results: MonteCarloReport,
}
