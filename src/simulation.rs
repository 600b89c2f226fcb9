// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Simulation Core

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use wasm_bindgen::prelude::*;

use crate::antenna::Antenna;
use crate::confidentiality::ConfidentialityContext;
use crate::error::SetupError;
use crate::road::RoadNetwork;
use crate::types::*;
use crate::vehicle::{InterceptOutcome, Vehicle, V2V_RANGE};

// ─── SimulationEngine struct ─────────────────────────────────────────────────

#[wasm_bindgen]
pub struct SimulationEngine {
    pub(crate) seed: u64,
    pub(crate) network: RoadNetwork,
    pub(crate) antennas: Vec<Antenna>,
    pub(crate) vehicles: Vec<Vehicle>,
    pub(crate) ctx: Arc<ConfidentialityContext>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) current_tick: u64,

    // Run history handed to reporting
    pub(crate) records: Vec<ConnectionRecord>,
    pub(crate) congestion_per_tick: Vec<u32>,
    pub(crate) interceptions_per_tick: Vec<u32>,
    pub(crate) completed: Vec<String>,
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl SimulationEngine {
    /// Wire validated populations into an engine. Antennas are kept in id
    /// order; vehicles keep the given order.
    pub fn assemble(
        seed: u64,
        network: RoadNetwork,
        mut antennas: Vec<Antenna>,
        vehicles: Vec<Vehicle>,
        ctx: Arc<ConfidentialityContext>,
        rng: ChaCha8Rng,
    ) -> Result<Self, SetupError> {
        network.validate()?;
        antennas.sort_by_key(|a| a.id);
        if let Some(pair) = antennas.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(SetupError::DuplicateAntenna(pair[0].id));
        }
        let mut seen = BTreeSet::new();
        for vehicle in &vehicles {
            if !seen.insert(vehicle.id) {
                return Err(SetupError::DuplicateVehicle(vehicle.id));
            }
        }

        // Single-node routes are complete before the first tick.
        let completed = vehicles
            .iter()
            .filter(|v| v.is_completed())
            .map(|v| v.pseudonym.clone())
            .collect();

        Ok(Self {
            seed,
            network,
            antennas,
            vehicles,
            ctx,
            rng,
            current_tick: 0,
            records: Vec::new(),
            congestion_per_tick: Vec::new(),
            interceptions_per_tick: Vec::new(),
            completed,
        })
    }

    pub fn tick_core(&mut self) -> TickResult {
        self.current_tick += 1;
        let tick = self.current_tick;

        // a. Antenna self-update: failure, degradation, congestion decay
        let mut failures = 0;
        for antenna in &mut self.antennas {
            if antenna.update(tick, &mut self.rng) {
                failures += 1;
            }
        }
        let total_congestion: u32 = self.antennas.iter().map(|a| a.congestion).sum();

        // b. Vehicle pass
        let newly_completed = self.vehicle_pass(tick);

        // c. Espionage
        let interceptions = self.espionage_pass(tick);

        // d. Queue processing
        let mut records = Vec::new();
        let mut antenna_updates = Vec::with_capacity(self.antennas.len());
        for antenna in &mut self.antennas {
            let batch = antenna.process_queue(tick, &mut self.vehicles, &self.ctx);
            antenna_updates.push(AntennaUpdate {
                id: antenna.id,
                available: antenna.is_available(),
                congestion: antenna.congestion,
                range: antenna.range,
                admitted: antenna.active_connections,
            });
            records.extend(batch);
        }

        // e/f. V2V advisories
        self.broadcast_advisories();
        for vehicle in &mut self.vehicles {
            vehicle.process_advisories();
        }

        self.congestion_per_tick.push(total_congestion);
        self.interceptions_per_tick.push(interceptions);
        self.records.extend(records.iter().cloned());

        debug!(
            tick,
            records = records.len(),
            congestion = total_congestion,
            interceptions,
            failures,
            "tick complete"
        );

        TickResult {
            tick,
            records,
            total_congestion,
            interceptions,
            failures,
            newly_completed,
            antenna_updates,
        }
    }

    fn vehicle_pass(&mut self, tick: u64) -> Vec<String> {
        let mut newly_completed = Vec::new();
        for i in 0..self.vehicles.len() {
            let vehicle = &mut self.vehicles[i];
            let was_completed = vehicle.is_completed();
            vehicle.move_step();
            if !was_completed && vehicle.is_completed() {
                newly_completed.push(vehicle.pseudonym.clone());
                self.completed.push(vehicle.pseudonym.clone());
            }

            for antenna in &mut self.antennas {
                vehicle.attempt_connection(i, antenna);
            }

            for j in 0..self.vehicles.len() {
                if j == i {
                    continue;
                }
                let (relay, peer) = pair_mut(&mut self.vehicles, i, j);
                for antenna in &self.antennas {
                    relay.relay(peer, antenna, tick);
                }
            }
        }
        newly_completed
    }

    /// One attempt per malicious, undetected vehicle against a uniformly
    /// drawn member of the whole population. Drawing itself skips the turn.
    fn espionage_pass(&mut self, tick: u64) -> u32 {
        let n = self.vehicles.len();
        let mut interceptions = 0;
        for i in 0..n {
            if !self.vehicles[i].malicious || self.vehicles[i].is_detected() {
                continue;
            }
            let target = self.rng.gen_range(0..n);
            if target == i {
                continue;
            }
            let (spy, victim) = pair_mut(&mut self.vehicles, i, target);
            match spy.intercept(victim, tick) {
                Ok(outcome) => {
                    if let InterceptOutcome::Intercepted { detected_now } = outcome {
                        interceptions += 1;
                        if detected_now {
                            info!(tick, spy = %spy.pseudonym, "spy detected");
                        }
                    }
                }
                Err(e) => {
                    warn!(tick, spy = %spy.pseudonym, error = %e, "interception skipped");
                }
            }
            // The victim notices the attempt even when nothing was readable.
            victim.suspect(&spy.pseudonym);
        }
        interceptions
    }

    fn broadcast_advisories(&mut self) {
        let mut deliveries = Vec::new();
        for (i, sender) in self.vehicles.iter().enumerate() {
            let Some(advisory) = sender.advisory() else {
                continue;
            };
            for (j, receiver) in self.vehicles.iter().enumerate() {
                if j != i && sender.position.distance(&receiver.position) <= V2V_RANGE {
                    deliveries.push((j, advisory.clone()));
                }
            }
        }
        for (j, advisory) in deliveries {
            self.vehicles[j].receive_advisory(advisory);
        }
    }

    /// Drive `ticks` ticks and summarise the whole run so far.
    pub fn run(&mut self, ticks: u64) -> RunSummary {
        info!(
            seed = self.seed,
            ticks,
            antennas = self.antennas.len(),
            vehicles = self.vehicles.len(),
            "simulation started"
        );
        for _ in 0..ticks {
            self.tick_core();
        }
        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            records = summary.records.len(),
            completed = summary.completed.len(),
            "simulation finished"
        );
        summary
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            ticks: self.current_tick,
            records: self.records.clone(),
            congestion_per_tick: self.congestion_per_tick.clone(),
            interceptions_per_tick: self.interceptions_per_tick.clone(),
            completed: self.completed.clone(),
            antenna_tallies: self.antennas.iter().map(|a| (a.id, a.tally())).collect(),
        }
    }

    /// Force an outage on antenna `id`. Returns false for an unknown id.
    pub fn take_antenna_offline(&mut self, id: u32, ticks: u32) -> bool {
        match self.antennas.iter_mut().find(|a| a.id == id) {
            Some(antenna) => {
                antenna.take_offline(ticks);
                true
            }
            None => false,
        }
    }

    pub fn seed(&self) -> u64 { self.seed }
    pub fn current_tick(&self) -> u64 { self.current_tick }
    pub fn network(&self) -> &RoadNetwork { &self.network }
    pub fn antennas(&self) -> &[Antenna] { &self.antennas }
    pub fn vehicles(&self) -> &[Vehicle] { &self.vehicles }
    pub fn records(&self) -> &[ConnectionRecord] { &self.records }
    pub fn context(&self) -> &Arc<ConfidentialityContext> { &self.ctx }
}

/// Two distinct mutable elements of one slice.
pub(crate) fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    assert_ne!(a, b, "pair_mut needs distinct indices");
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
