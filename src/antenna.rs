// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Antenna Logic

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::confidentiality::ConfidentialityContext;
use crate::congestion::CongestionSchedule;
use crate::types::{AntennaClass, AntennaTally, Availability, ConnectionRecord, Outcome, Point, Priority};
use crate::vehicle::Vehicle;

/// Maximum admissions per processing window.
pub const ANTENNA_CAPACITY: u32 = 5;
/// Per-tick probability that an available antenna fails.
pub const FAILURE_PROBABILITY: f64 = 0.05;
/// Longest repair time in ticks; durations are drawn from `1..=MAX_REPAIR_TICKS`.
pub const MAX_REPAIR_TICKS: u32 = 5;
/// Floor for range lost to continuous degradation.
pub const DEGRADATION_RANGE_FLOOR: f64 = 50.0;
/// Floor for range recomputed from congestion.
pub const CONGESTION_RANGE_FLOOR: f64 = 100.0;
/// Range lost per unit of congestion.
pub const RANGE_LOSS_PER_CONGESTION: f64 = 10.0;

// ─── Queue entry ─────────────────────────────────────────────────────────────

/// A pending request: the submitter's priority and its slot in the engine's
/// vehicle population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedRequest {
    pub priority: Priority,
    pub vehicle: usize,
}

// ─── Antenna ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Antenna {
    pub id: u32,
    pub reliability: i32,
    pub position: Point,
    pub class: AntennaClass,
    pub range: f64,
    pub availability: Availability,
    pub repair_remaining: u32,
    pub congestion: u32,
    #[serde(skip)]
    schedule: CongestionSchedule,
    #[serde(skip)]
    queue: Vec<QueuedRequest>,
    pub capacity: u32,
    pub failure_probability: f64,
    pub active_connections: u32,
    pub total_connections: u32,
    pub failure_count: u32,
    pub congestion_increments: u32,
    pub outcomes: BTreeMap<Outcome, u32>,
}

impl Antenna {
    pub fn new(id: u32, reliability: i32, position: Point, class: AntennaClass) -> Self {
        Self {
            id,
            reliability,
            position,
            class,
            range: class.base_range(),
            availability: Availability::Available,
            repair_remaining: 0,
            congestion: 0,
            schedule: CongestionSchedule::new(),
            queue: Vec::new(),
            capacity: ANTENNA_CAPACITY,
            failure_probability: FAILURE_PROBABILITY,
            active_connections: 0,
            total_connections: 0,
            failure_count: 0,
            congestion_increments: 0,
            outcomes: BTreeMap::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability == Availability::Available
    }

    pub fn base_range(&self) -> f64 {
        self.class.base_range()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn schedule(&self) -> &CongestionSchedule {
        &self.schedule
    }

    /// Queue a request for the vehicle at `slot`. Always succeeds.
    pub fn submit_request(&mut self, priority: Priority, slot: usize) {
        self.queue.push(QueuedRequest { priority, vehicle: slot });
    }

    /// Serve the queue in priority order, up to capacity, then clear it.
    ///
    /// Ties keep submission order. Requests beyond capacity are dropped.
    /// A failed antenna leaves its queue untouched until it is repaired.
    /// Returns the records created this window.
    pub fn process_queue(
        &mut self,
        tick: u64,
        vehicles: &mut [Vehicle],
        ctx: &ConfidentialityContext,
    ) -> Vec<ConnectionRecord> {
        self.active_connections = 0;
        if !self.is_available() || self.queue.is_empty() {
            return Vec::new();
        }

        let mut queue = std::mem::take(&mut self.queue);
        // Vec::sort_by is stable: equal ranks keep FIFO order.
        queue.sort_by(|a, b| b.priority.rank().cmp(&a.priority.rank()));

        let mut records = Vec::new();
        for request in queue {
            if self.active_connections >= self.capacity {
                break;
            }
            let Some(vehicle) = vehicles.get_mut(request.vehicle) else {
                continue;
            };
            let record = vehicle.complete_connection(self, tick, ctx);
            *self.outcomes.entry(record.outcome).or_insert(0) += 1;
            records.push(record);
            self.active_connections += 1;
            self.total_connections += 1;
        }
        records
    }

    /// Failure/repair step. Draws once from `rng` when available, and a
    /// second time for the repair duration on failure.
    pub fn verify_failure<R: Rng>(&mut self, rng: &mut R) -> bool {
        match self.availability {
            Availability::Available => {
                if rng.gen::<f64>() < self.failure_probability {
                    self.availability = Availability::Failed;
                    self.repair_remaining = rng.gen_range(1..=MAX_REPAIR_TICKS);
                    self.failure_count += 1;
                    debug!(antenna = self.id, repair = self.repair_remaining, "antenna failed");
                    return true;
                }
            }
            Availability::Failed => {
                self.repair_remaining = self.repair_remaining.saturating_sub(1);
                if self.repair_remaining == 0 {
                    self.availability = Availability::Available;
                    debug!(antenna = self.id, "antenna repaired");
                }
            }
        }
        false
    }

    pub fn update_degradation<R: Rng>(&mut self, rng: &mut R) {
        let degradation: f64 = rng.gen();
        self.range = (self.range - degradation).max(DEGRADATION_RANGE_FLOOR);
    }

    pub fn increment_congestion(&mut self, tick: u64) {
        self.congestion += 1;
        self.congestion_increments += 1;
        self.schedule.schedule(tick);
        self.recompute_range();
    }

    pub fn decay_congestion(&mut self, tick: u64) {
        let due = self.schedule.take_due(tick);
        self.congestion = self.congestion.saturating_sub(due);
        self.recompute_range();
    }

    /// Congestion-derived range. Overwrites whatever degradation produced.
    fn recompute_range(&mut self) {
        self.range = (self.base_range() - self.congestion as f64 * RANGE_LOSS_PER_CONGESTION)
            .max(CONGESTION_RANGE_FLOOR);
    }

    /// Per-tick self-update in its fixed order. Returns whether the antenna
    /// failed this tick.
    pub fn update<R: Rng>(&mut self, tick: u64, rng: &mut R) -> bool {
        let failed = self.verify_failure(rng);
        self.update_degradation(rng);
        self.decay_congestion(tick);
        failed
    }

    pub fn tally(&self) -> AntennaTally {
        AntennaTally {
            failures: self.failure_count,
            congestion_increments: self.congestion_increments,
            final_congestion: self.congestion,
            total_connections: self.total_connections,
            outcomes: self.outcomes.clone(),
        }
    }

    /// Force an outage lasting `ticks` repair steps (scenario hook).
    pub fn take_offline(&mut self, ticks: u32) {
        self.availability = Availability::Failed;
        self.repair_remaining = ticks.max(1);
        self.failure_count += 1;
    }
}
