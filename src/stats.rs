// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Run Statistics

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::types::{AntennaTally, Outcome, RunSummary};
use crate::vehicle::Vehicle;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PrivacySplit {
    pub accepted: u32,
    pub refused: u32,
    /// Records intercepted by spies in this group.
    pub intercepted: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EspionageEntry {
    pub tick: u64,
    pub spy: String,
    pub spy_detected: bool,
    pub victim: String,
}

/// Aggregate view of one run, built after the fact from the summary and the
/// final vehicle states.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub ticks: u64,
    pub total_records: usize,
    pub total_accepted: u32,
    pub total_refused: u32,
    pub total_failures: u32,
    pub total_out_of_range: u32,
    pub mean_accepted_time: f64,
    pub privacy: PrivacySplit,
    pub non_privacy: PrivacySplit,
    pub per_antenna: BTreeMap<u32, AntennaTally>,
    pub espionage: Vec<EspionageEntry>,
    pub detected_spies: Vec<String>,
    /// Cumulative accepted service time per pseudonym.
    pub connected_time: BTreeMap<String, f64>,
    pub completed: Vec<String>,
    pub congestion_per_tick: Vec<u32>,
    pub interceptions_per_tick: Vec<u32>,
}

impl RunStats {
    pub fn from_summary(summary: &RunSummary, vehicles: &[Vehicle]) -> Self {
        let privacy_by_id: HashMap<u32, bool> =
            vehicles.iter().map(|v| (v.id, v.privacy_aware)).collect();

        let mut stats = Self {
            ticks: summary.ticks,
            total_records: summary.records.len(),
            total_accepted: 0,
            total_refused: 0,
            total_failures: 0,
            total_out_of_range: 0,
            mean_accepted_time: 0.0,
            privacy: PrivacySplit::default(),
            non_privacy: PrivacySplit::default(),
            per_antenna: summary.antenna_tallies.clone(),
            espionage: Vec::new(),
            detected_spies: Vec::new(),
            connected_time: BTreeMap::new(),
            completed: summary.completed.clone(),
            congestion_per_tick: summary.congestion_per_tick.clone(),
            interceptions_per_tick: summary.interceptions_per_tick.clone(),
        };

        let mut accepted_time = 0.0;
        for record in &summary.records {
            let private = privacy_by_id.get(&record.vehicle_id).copied().unwrap_or(false);
            let group = if private { &mut stats.privacy } else { &mut stats.non_privacy };
            let outcome = record.outcome;
            if outcome == Outcome::Accepted {
                stats.total_accepted += 1;
                group.accepted += 1;
                accepted_time += record.service_time;
                *stats.connected_time.entry(record.pseudonym.clone()).or_insert(0.0) +=
                    record.service_time;
            } else if outcome.is_refusal() {
                stats.total_refused += 1;
                group.refused += 1;
            } else if outcome == Outcome::Failure {
                stats.total_failures += 1;
            } else {
                stats.total_out_of_range += 1;
            }
        }
        if stats.total_accepted > 0 {
            stats.mean_accepted_time = accepted_time / stats.total_accepted as f64;
        }

        for spy in vehicles {
            if spy.is_detected() {
                stats.detected_spies.push(spy.pseudonym.clone());
            }
            let group = if spy.privacy_aware { &mut stats.privacy } else { &mut stats.non_privacy };
            group.intercepted += spy.intercepted.len() as u32;
            for entry in &spy.intercepted {
                stats.espionage.push(EspionageEntry {
                    tick: entry.tick,
                    spy: spy.pseudonym.clone(),
                    spy_detected: spy.is_detected(),
                    victim: entry.victim_pseudonym.clone(),
                });
            }
        }
        stats.espionage.sort_by_key(|e| e.tick);
        stats
    }

    /// Share of non-failed attempts that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        let decided = self.total_accepted + self.total_refused + self.total_out_of_range;
        if decided == 0 {
            0.0
        } else {
            self.total_accepted as f64 / decided as f64
        }
    }

    pub fn total_interceptions(&self) -> u32 {
        self.privacy.intercepted + self.non_privacy.intercepted
    }
}
