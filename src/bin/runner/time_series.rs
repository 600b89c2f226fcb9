// Per-Tick JSONL Time Series Recorder
// Outputs one JSON line per tick for independent analysis

use roadlink_engine::{AntennaUpdate, Outcome, TickResult};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub total_congestion: u32,
    pub interceptions: u32,
    pub antenna_failures: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub out_of_range: u32,
    pub failure_outcomes: u32,
    pub energy_refused: u32,
    pub newly_completed: Vec<String>,
    pub antennas: Vec<AntennaUpdate>,
    /// Hex-encoded sealed payloads created this tick, in record order.
    pub sealed: Vec<String>,
}

impl TickSnapshot {
    pub fn from_result(result: &TickResult) -> Self {
        let count = |outcome: Outcome| {
            result.records.iter().filter(|r| r.outcome == outcome).count() as u32
        };
        Self {
            tick: result.tick,
            total_congestion: result.total_congestion,
            interceptions: result.interceptions,
            antenna_failures: result.failures,
            accepted: count(Outcome::Accepted),
            rejected: count(Outcome::Rejected),
            out_of_range: count(Outcome::OutOfRange),
            failure_outcomes: count(Outcome::Failure),
            energy_refused: count(Outcome::EnergyRefused),
            newly_completed: result.newly_completed.clone(),
            antennas: result.antenna_updates.clone(),
            sealed: result
                .records
                .iter()
                .filter_map(|r| r.payload.as_ref().map(|p| p.to_hex()))
                .collect(),
        }
    }
}

/// Time series recorder that accumulates snapshots and writes JSONL
pub struct TimeSeriesRecorder {
    snapshots: Vec<TickSnapshot>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { snapshots: Vec::new() }
    }

    pub fn record(&mut self, result: &TickResult) {
        self.snapshots.push(TickSnapshot::from_result(result));
    }

    /// Write all snapshots to a JSONL file
    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for snapshot in &self.snapshots {
            let line = serde_json::to_string(snapshot)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}
