// Roadlink Runner v0.1.0 — seeded V2X connectivity and privacy runs
// Writes results to roadlink-results/run-{timestamp}.json
//
// Usage:
//   cargo run --release --bin roadlink                           # Reference scenario, seed 0
//   cargo run --release --bin roadlink -- --runs 30              # 30 seeds, mean ± 95% CI
//   cargo run --release --bin roadlink -- --scenario city.toml   # Scenario file
//   cargo run --release --bin roadlink -- --ticks 50 --seed 42   # Custom length and base seed
//   cargo run --release --bin roadlink -- --time-series          # Enable JSONL output
//
// RUST_LOG controls engine logging (default: info).

mod monte_carlo;
mod report;
mod time_series;

use anyhow::{bail, Context};
use roadlink_engine::ScenarioConfig;
use tracing_subscriber::EnvFilter;

use monte_carlo::ScenarioSource;
use report::*;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// ─── CLI Parsing ────────────────────────────────────────────────────────────

struct CliArgs {
    ticks: Option<u64>,
    runs: usize,
    seed: u64,
    scenario: Option<PathBuf>,
    time_series: bool,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut cli = CliArgs {
        ticks: None,
        runs: 1,
        seed: 0,
        scenario: None,
        time_series: false,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--ticks" => {
                i += 1;
                let value = args.get(i).context("--ticks needs a value")?;
                cli.ticks = Some(value.parse().with_context(|| format!("invalid --ticks {}", value))?);
            }
            "--runs" => {
                i += 1;
                let value = args.get(i).context("--runs needs a value")?;
                cli.runs = value.parse().with_context(|| format!("invalid --runs {}", value))?;
            }
            "--seed" => {
                i += 1;
                let value = args.get(i).context("--seed needs a value")?;
                cli.seed = value.parse().with_context(|| format!("invalid --seed {}", value))?;
            }
            "--scenario" => {
                i += 1;
                let value = args.get(i).context("--scenario needs a path")?;
                cli.scenario = Some(PathBuf::from(value));
            }
            "--time-series" => {
                cli.time_series = true;
            }
            other => {
                eprintln!("Unknown argument: {}", other);
            }
        }
        i += 1;
    }

    if cli.runs == 0 {
        bail!("--runs must be at least 1");
    }
    Ok(cli)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

// ─── Main ───────────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = parse_args()?;

    let (source, scenario_label, default_ticks) = match &cli.scenario {
        Some(path) => {
            let config = ScenarioConfig::load(path)
                .with_context(|| format!("loading scenario {}", path.display()))?;
            let ticks = config.ticks;
            (ScenarioSource::File(config), path.display().to_string(), ticks)
        }
        None => (
            ScenarioSource::Random,
            "reference (random pools)".to_string(),
            roadlink_engine::config::DEFAULT_TICKS,
        ),
    };
    let ticks = cli.ticks.unwrap_or(default_ticks);

    let ts_dir = if cli.time_series {
        Some(Path::new("roadlink-results/time-series").to_path_buf())
    } else {
        None
    };

    println!("\n  Roadlink Runner v0.1.0");
    println!("  PRNG: ChaCha8Rng | Runs: {} | Ticks: {} | Base seed: {}", cli.runs, ticks, cli.seed);
    println!("  Scenario: {}\n", scenario_label);
    println!("  {:<8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>7}",
        "Seed", "Accept", "Refuse", "Fail", "OutRng", "Interc", "Spies", "Time");
    println!("  {}", "-".repeat(76));

    let suite_start = Instant::now();
    let results = monte_carlo::run_monte_carlo(&source, cli.runs, cli.seed, ticks, ts_dir.as_deref())?;

    for run in &results.individual_runs {
        println!("  {:<8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>5}ms",
            run.seed,
            run.stats.total_accepted,
            run.stats.total_refused,
            run.stats.total_failures,
            run.stats.total_out_of_range,
            run.stats.total_interceptions(),
            run.stats.detected_spies.len(),
            run.elapsed_ms,
        );
    }

    println!("  {}", "-".repeat(76));
    println!("  Acceptance rate:      {:.1}% ± {:.1}",
        results.acceptance_rate.mean * 100.0,
        (results.acceptance_rate.ci_upper - results.acceptance_rate.ci_lower) * 50.0);
    println!("  Mean service time:    {:.2}", results.mean_accepted_time.mean);
    println!("  Accepted (priv/open): {:.1} / {:.1}",
        results.privacy_accepted.mean, results.non_privacy_accepted.mean);
    println!("  Intercepted (priv/open): {:.1} / {:.1}",
        results.privacy_intercepted.mean, results.non_privacy_intercepted.mean);
    println!("  Suite time: {:.1}s\n", suite_start.elapsed().as_secs_f64());

    // ─── Write JSON Report ──────────────────────────────────────────────

    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before UNIX epoch")?
        .as_millis();
    let timestamp = format!("{}", ts);

    let report = RunReport {
        timestamp: timestamp.clone(),
        version: "0.1.0",
        prng: "ChaCha8Rng",
        scenario_source: scenario_label,
        ticks,
        base_seed: cli.seed,
        results,
    };

    let dir = Path::new("roadlink-results");
    std::fs::create_dir_all(dir).context("creating roadlink-results/")?;
    let path = dir.join(format!("run-{}.json", timestamp));
    let json = serde_json::to_string_pretty(&report).context("serializing report")?;
    std::fs::write(&path, &json).with_context(|| format!("writing {}", path.display()))?;
    println!("  Results saved to: {}\n", path.display());

    Ok(())
}
