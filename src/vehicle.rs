// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Vehicle Logic
//
// Route progress, energy budget, access policy, connection completion,
// relaying, espionage and V2V advisories for a single vehicle.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::antenna::Antenna;
use crate::confidentiality::ConfidentialityContext;
use crate::error::{SetupError, SimError};
use crate::road::RoadNetwork;
use crate::types::{
    Advisory, ConnectionRecord, Detection, EnergyType, InterceptedRecord, Outcome, Point,
    Priority, RelayRecord, RouteState,
};

// Connection cost model
pub const FIXED_COST: f64 = 2.0;
pub const DISTANCE_COST: f64 = 0.1;
pub const BASE_TIME: f64 = 1.0;
pub const TIME_PER_UNIT: f64 = 0.05;
pub const RELIABILITY_TIME_FACTOR: f64 = 0.3;
pub const CONGESTION_TIME_FACTOR: f64 = 0.2;

// Energy policy
pub const ENERGY_REFUSAL_THRESHOLD: f64 = 5.0;
pub const ENERGY_ADAPTATION_THRESHOLD: f64 = 30.0;

// Privacy and detection
pub const PRIVACY_RELIABILITY_THRESHOLD: i32 = 4;
pub const ADVISORY_RELIABILITY_THRESHOLD: i32 = 4;
pub const SUSPICION_THRESHOLD: u32 = 2;
pub const V2V_RANGE: f64 = 50.0;

const PSEUDONYM_LEN: usize = 6;
const PSEUDONYM_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// ─── VehicleSpec ─────────────────────────────────────────────────────────────

/// Setup-time description of a vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleSpec {
    pub id: u32,
    pub route: Vec<String>,
    pub max_speed: f64,
    #[serde(default)]
    pub priority: Priority,
    pub exigence: i32,
    #[serde(default)]
    pub malicious: bool,
    #[serde(default)]
    pub privacy_aware: bool,
    pub energy_type: EnergyType,
    /// Fraction of the first segment already covered at setup.
    #[serde(default)]
    pub start_offset: f64,
}

impl Default for VehicleSpec {
    fn default() -> Self {
        Self {
            id: 0,
            route: Vec::new(),
            max_speed: 5.0,
            priority: Priority::Standard,
            exigence: 3,
            malicious: false,
            privacy_aware: false,
            energy_type: EnergyType::Electric,
            start_offset: 0.0,
        }
    }
}

/// Draw a 6-character pseudonym from `A-Z0-9`.
pub fn generate_pseudonym<R: Rng>(rng: &mut R) -> String {
    (0..PSEUDONYM_LEN)
        .map(|_| PSEUDONYM_ALPHABET[rng.gen_range(0..PSEUDONYM_ALPHABET.len())] as char)
        .collect()
}

// ─── Leg ─────────────────────────────────────────────────────────────────────

/// One resolved route segment `route[i] -> route[i + 1]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct Leg {
    from: Point,
    to: Point,
    length: f64,
    speed_limit: f64,
}

// ─── Interception outcome ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// Not malicious, or already detected.
    Inactive,
    /// Target has no connection history yet.
    NothingToRead,
    Intercepted { detected_now: bool },
}

// ─── Vehicle ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u32,
    pub pseudonym: String,
    pub route: Vec<String>,
    pub max_speed: f64,
    pub priority: Priority,
    pub exigence: i32,
    pub malicious: bool,
    pub privacy_aware: bool,
    pub energy_type: EnergyType,
    pub initial_energy: f64,
    pub energy: f64,
    pub position: Point,
    pub current_index: usize,
    pub next_index: usize,
    pub segment_length: f64,
    pub remaining_segment: f64,
    pub route_state: RouteState,
    legs: Vec<Leg>,

    pub history: Vec<ConnectionRecord>,
    pub relays_received: Vec<RelayRecord>,
    pub intercepted: Vec<InterceptedRecord>,
    pub suspicion_score: u32,
    pub detection: Detection,
    pub suspected_peers: BTreeMap<String, u32>,
    #[serde(skip)]
    inbox: Vec<Advisory>,
    pub connected_time: f64,
}

impl Vehicle {
    /// Build a vehicle on its route. Fails if the route does not follow the
    /// road network. Draws the pseudonym from `rng`.
    pub fn new<R: Rng>(
        spec: VehicleSpec,
        network: &RoadNetwork,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        network.validate_route(spec.id, &spec.route)?;
        if !(spec.max_speed > 0.0) {
            return Err(SetupError::InvalidSpeed(spec.id));
        }
        if !(0.0..1.0).contains(&spec.start_offset) {
            return Err(SetupError::InvalidStartOffset(spec.id));
        }

        let mut legs = Vec::with_capacity(spec.route.len().saturating_sub(1));
        for step in spec.route.windows(2) {
            let edge = network.edge(&step[0], &step[1]).ok_or_else(|| SetupError::MissingEdge {
                vehicle: spec.id,
                from: step[0].clone(),
                to: step[1].clone(),
            })?;
            let from = network
                .intersection(&step[0])
                .ok_or_else(|| SetupError::UnknownIntersection(step[0].clone()))?;
            let to = network
                .intersection(&step[1])
                .ok_or_else(|| SetupError::UnknownIntersection(step[1].clone()))?;
            let speed_limit = network
                .speed_limit(edge.class)
                .ok_or(SetupError::MissingSpeedLimit(edge.class))?;
            legs.push(Leg { from, to, length: edge.distance, speed_limit });
        }
        let start = network
            .intersection(&spec.route[0])
            .ok_or_else(|| SetupError::UnknownIntersection(spec.route[0].clone()))?;

        let offset = spec.start_offset;
        let pseudonym = generate_pseudonym(rng);
        let mut vehicle = Self::assemble(spec, legs, start, pseudonym);
        vehicle.apply_start_offset(offset);
        Ok(vehicle)
    }

    /// A vehicle that never moves, parked at `position`.
    pub fn stationary(mut spec: VehicleSpec, position: Point, pseudonym: &str) -> Self {
        spec.route = vec![format!("@{}", spec.id)];
        spec.start_offset = 0.0;
        Self::assemble(spec, Vec::new(), position, pseudonym.to_string())
    }

    fn assemble(spec: VehicleSpec, legs: Vec<Leg>, start: Point, pseudonym: String) -> Self {
        let initial_energy = spec.energy_type.initial_energy();
        let has_leg = !legs.is_empty();
        let (segment_length, route_state) = match legs.first() {
            Some(leg) => (leg.length, RouteState::InTransit),
            None => (0.0, RouteState::Completed),
        };
        Self {
            id: spec.id,
            pseudonym,
            route: spec.route,
            max_speed: spec.max_speed,
            priority: spec.priority,
            exigence: spec.exigence,
            malicious: spec.malicious,
            privacy_aware: spec.privacy_aware,
            energy_type: spec.energy_type,
            initial_energy,
            energy: initial_energy,
            position: start,
            current_index: 0,
            next_index: if has_leg { 1 } else { 0 },
            segment_length,
            remaining_segment: segment_length,
            route_state,
            legs,
            history: Vec::new(),
            relays_received: Vec::new(),
            intercepted: Vec::new(),
            suspicion_score: 0,
            detection: Detection::Undetected,
            suspected_peers: BTreeMap::new(),
            inbox: Vec::new(),
            connected_time: 0.0,
        }
    }

    fn apply_start_offset(&mut self, ratio: f64) {
        if ratio <= 0.0 {
            return;
        }
        if let Some(leg) = self.legs.first() {
            self.position = leg.from.lerp(&leg.to, ratio);
            self.remaining_segment = self.segment_length * (1.0 - ratio);
        }
    }

    pub fn is_completed(&self) -> bool {
        self.route_state == RouteState::Completed
    }

    pub fn is_detected(&self) -> bool {
        self.detection == Detection::Detected
    }

    pub fn distance_to(&self, point: &Point) -> f64 {
        self.position.distance(point)
    }

    fn consume_energy(&mut self, amount: f64) {
        self.energy = (self.energy - amount).max(0.0);
    }

    fn connection_overhead(&mut self) {
        self.consume_energy(self.energy_type.connection_rate());
    }

    // ─── Motion ─────────────────────────────────────────────────────────────

    /// Advance along the route by one tick. Returns the distance travelled.
    ///
    /// The step is fixed from the segment the vehicle starts the tick on and
    /// may carry it across several intersections.
    pub fn move_step(&mut self) -> f64 {
        if self.is_completed() {
            return 0.0;
        }
        let Some(leg) = self.legs.get(self.current_index).copied() else {
            return 0.0;
        };
        let mut budget = self.max_speed.min(leg.speed_limit);
        let mut travelled = 0.0;

        while budget > 0.0 {
            let Some(leg) = self.legs.get(self.current_index).copied() else {
                break;
            };
            if budget < self.remaining_segment {
                self.position = advance(self.position, &leg, budget);
                self.remaining_segment -= budget;
                self.consume_energy(self.energy_type.base_rate() * budget);
                travelled += budget;
                break;
            }

            let leftover = self.remaining_segment;
            self.position = leg.to;
            self.consume_energy(self.energy_type.base_rate() * leftover);
            travelled += leftover;
            budget -= leftover;
            self.remaining_segment = 0.0;

            self.current_index = self.next_index;
            if self.next_index + 1 < self.route.len() {
                self.next_index += 1;
                self.segment_length = self.legs[self.current_index].length;
                self.remaining_segment = self.segment_length;
            } else {
                self.next_index = self.current_index;
                self.route_state = RouteState::Completed;
                debug!(vehicle = self.id, pseudonym = %self.pseudonym, "route completed");
                break;
            }
        }
        travelled
    }

    // ─── Access policy ──────────────────────────────────────────────────────

    /// Under low energy, lower exigence (floor 1) and downgrade priority one
    /// step. Applied again on every call while energy stays low.
    pub fn apply_energy_adaptation(&mut self) {
        if self.energy < ENERGY_ADAPTATION_THRESHOLD {
            self.exigence = (self.exigence - 1).max(1);
            self.priority = self.priority.downgraded();
        }
    }

    /// Submit a request to `antenna` unless privacy policy says abstain.
    /// `slot` is this vehicle's index in the engine population.
    pub fn attempt_connection(&mut self, slot: usize, antenna: &mut Antenna) -> bool {
        self.apply_energy_adaptation();
        if self.privacy_aware && antenna.reliability < PRIVACY_RELIABILITY_THRESHOLD {
            return false;
        }
        antenna.submit_request(self.priority, slot);
        true
    }

    /// Serve one admitted request. Appends exactly one record and returns a
    /// copy of it.
    pub fn complete_connection(
        &mut self,
        antenna: &mut Antenna,
        tick: u64,
        ctx: &ConfidentialityContext,
    ) -> ConnectionRecord {
        let distance = self.distance_to(&antenna.position);

        let (outcome, cost, time) = if self.energy < ENERGY_REFUSAL_THRESHOLD {
            (Outcome::EnergyRefused, 0.0, 0.0)
        } else if !antenna.is_available() {
            self.consume_energy(FIXED_COST);
            self.connection_overhead();
            (Outcome::Failure, FIXED_COST, BASE_TIME)
        } else {
            antenna.increment_congestion(tick);
            let outcome = if distance <= antenna.range {
                if self.priority.admits(self.exigence, antenna.reliability) {
                    Outcome::Accepted
                } else {
                    Outcome::Rejected
                }
            } else {
                Outcome::OutOfRange
            };
            let cost = FIXED_COST + distance * DISTANCE_COST;
            let time = service_time(distance, antenna.reliability, antenna.congestion);
            self.consume_energy(cost);
            if outcome == Outcome::Accepted {
                self.connection_overhead();
                self.connected_time += time;
            }
            (outcome, cost, time)
        };

        let summary = format!(
            "Pseudonym: {}, Priority: {}, Outcome: {}, Distance: {:.2}, Time: {:.2}, \
             Reliability: {}, Congestion: {}, Cost: {:.2}, EnergyRemaining: {:.2}",
            self.pseudonym,
            self.priority,
            outcome,
            distance,
            time,
            antenna.reliability,
            antenna.congestion,
            cost,
            self.energy,
        );
        let payload = match ctx.seal(&summary) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(vehicle = self.id, antenna = antenna.id, error = %e, "record stored without payload");
                None
            }
        };

        let record = ConnectionRecord {
            tick,
            vehicle_id: self.id,
            pseudonym: self.pseudonym.clone(),
            energy_type: self.energy_type,
            malicious: self.malicious,
            detected: self.is_detected(),
            suspicion_score: self.suspicion_score,
            priority: self.priority,
            exigence: self.exigence,
            initial_energy: self.initial_energy,
            energy_remaining: self.energy,
            antenna_id: antenna.id,
            antenna_reliability: antenna.reliability,
            antenna_congestion: antenna.congestion,
            outcome,
            distance,
            service_time: time,
            cost,
            payload,
        };
        self.history.push(record.clone());
        record
    }

    // ─── Cooperation ────────────────────────────────────────────────────────

    /// Forward reachability of `antenna` to `peer`. Returns whether a relay
    /// record was delivered.
    pub fn relay(&mut self, peer: &mut Vehicle, antenna: &Antenna, tick: u64) -> bool {
        if self.distance_to(&antenna.position) > antenna.range
            || !antenna.is_available()
            || self.is_detected()
        {
            return false;
        }
        peer.relays_received.push(RelayRecord {
            tick,
            antenna_id: antenna.id,
            relay_pseudonym: self.pseudonym.clone(),
            antenna_reliability: antenna.reliability,
        });
        self.connection_overhead();
        true
    }

    // ─── Espionage ──────────────────────────────────────────────────────────

    /// Copy the target's most recent sealed record.
    pub fn intercept(&mut self, target: &Vehicle, tick: u64) -> Result<InterceptOutcome, SimError> {
        if !self.malicious || self.is_detected() {
            return Ok(InterceptOutcome::Inactive);
        }
        let Some(last) = target.history.last() else {
            return Ok(InterceptOutcome::NothingToRead);
        };
        let payload = last.payload.clone().ok_or_else(|| SimError::MissingPayload {
            victim: target.pseudonym.clone(),
        })?;
        self.intercepted.push(InterceptedRecord {
            tick,
            victim_pseudonym: target.pseudonym.clone(),
            payload,
        });
        self.suspicion_score += 1;
        let detected_now = self.suspicion_score >= SUSPICION_THRESHOLD;
        if detected_now {
            self.detection = Detection::Detected;
            debug!(vehicle = self.id, pseudonym = %self.pseudonym, "interceptor detected");
        }
        Ok(InterceptOutcome::Intercepted { detected_now })
    }

    pub fn suspect(&mut self, peer_pseudonym: &str) {
        *self.suspected_peers.entry(peer_pseudonym.to_string()).or_insert(0) += 1;
    }

    // ─── V2V ────────────────────────────────────────────────────────────────

    /// Advisory naming antennas this vehicle was accepted on despite low
    /// reliability, or `None` if there are none.
    pub fn advisory(&self) -> Option<Advisory> {
        let mut antenna_ids: Vec<u32> = Vec::new();
        for record in &self.history {
            if record.outcome == Outcome::Accepted
                && record.antenna_reliability < ADVISORY_RELIABILITY_THRESHOLD
                && !antenna_ids.contains(&record.antenna_id)
            {
                antenna_ids.push(record.antenna_id);
            }
        }
        if antenna_ids.is_empty() {
            return None;
        }
        Some(Advisory { sender: self.pseudonym.clone(), antenna_ids })
    }

    pub fn receive_advisory(&mut self, advisory: Advisory) {
        self.inbox.push(advisory);
    }

    pub fn inbox_len(&self) -> usize {
        self.inbox.len()
    }

    /// Consume the inbox. Any advisory moves priority to Standard.
    /// Returns the number of advisories processed.
    pub fn process_advisories(&mut self) -> usize {
        let count = self.inbox.len();
        for advisory in self.inbox.drain(..) {
            if self.priority != Priority::Standard {
                debug!(
                    vehicle = self.id,
                    from = %advisory.sender,
                    previous = %self.priority,
                    "priority set to Standard by advisory"
                );
                self.priority = Priority::Standard;
            }
        }
        count
    }
}

/// Service time for a connection at `distance` from an antenna with the
/// given reliability and (post-increment) congestion.
pub fn service_time(distance: f64, reliability: i32, congestion: u32) -> f64 {
    let reliability_factor =
        (1.5 - (reliability - 3) as f64 * RELIABILITY_TIME_FACTOR).max(0.5);
    let congestion_factor = 1.0 + congestion as f64 * CONGESTION_TIME_FACTOR;
    BASE_TIME * (1.0 + distance * TIME_PER_UNIT) * reliability_factor * congestion_factor
}

fn advance(position: Point, leg: &Leg, distance: f64) -> Point {
    let ratio = distance / leg.length;
    Point {
        x: position.x + ratio * (leg.to.x - leg.from.x),
        y: position.y + ratio * (leg.to.y - leg.from.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AntennaClass, RoadClass};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn network() -> RoadNetwork {
        let mut net = RoadNetwork::new();
        net.add_intersection("A", Point::new(0.0, 0.0));
        net.add_intersection("B", Point::new(50.0, 0.0));
        net.add_intersection("C", Point::new(50.0, 20.0));
        net.add_road("A", "B", 50.0, RoadClass::Primary);
        net.add_road("B", "C", 20.0, RoadClass::Secondary);
        net.set_speed_limit(RoadClass::Primary, 80.0);
        net.set_speed_limit(RoadClass::Secondary, 5.0);
        net
    }

    fn route(nodes: &[&str]) -> Vec<String> {
        nodes.iter().map(|n| n.to_string()).collect()
    }

    fn driving(nodes: &[&str], max_speed: f64) -> Vehicle {
        let spec = VehicleSpec { id: 1, route: route(nodes), max_speed, ..VehicleSpec::default() };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        Vehicle::new(spec, &network(), &mut rng).unwrap()
    }

    fn parked(priority: Priority, exigence: i32) -> Vehicle {
        let spec = VehicleSpec { id: 7, priority, exigence, ..VehicleSpec::default() };
        Vehicle::stationary(spec, Point::new(10.0, 0.0), "PARK01")
    }

    fn antenna(reliability: i32) -> Antenna {
        Antenna::new(1, reliability, Point::new(0.0, 0.0), AntennaClass::Local)
    }

    fn ctx() -> ConfidentialityContext {
        ConfidentialityContext::from_key([7u8; 32])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // ─── Motion ─────────────────────────────────────────────────────────────

    #[test]
    fn test_partial_step_interpolates() {
        let mut v = driving(&["A", "B"], 10.0);
        assert!(approx(v.move_step(), 10.0));
        assert!(approx(v.position.x, 10.0));
        assert!(approx(v.remaining_segment, 40.0));
        assert!(approx(v.energy, 99.5));
        assert_eq!(v.route_state, RouteState::InTransit);
    }

    #[test]
    fn test_step_crosses_intersection() {
        let mut v = driving(&["A", "B", "C"], 60.0);
        assert!(approx(v.move_step(), 60.0));
        assert_eq!(v.current_index, 1);
        assert_eq!(v.next_index, 2);
        assert!(approx(v.position.x, 50.0));
        assert!(approx(v.position.y, 10.0));
        assert!(approx(v.remaining_segment, 10.0));
        assert!(approx(v.energy, 97.0));
    }

    #[test]
    fn test_step_capped_by_speed_limit() {
        let mut v = driving(&["B", "C"], 8.0);
        assert!(approx(v.move_step(), 5.0));
        assert!(approx(v.remaining_segment, 15.0));
    }

    #[test]
    fn test_completion_is_terminal() {
        let mut v = driving(&["A", "B"], 60.0);
        v.move_step();
        assert!(v.is_completed());
        assert_eq!(v.position, Point::new(50.0, 0.0));
        let energy = v.energy;
        assert_eq!(v.move_step(), 0.0);
        assert_eq!(v.position, Point::new(50.0, 0.0));
        assert_eq!(v.energy, energy);
        assert!(v.is_completed());
    }

    #[test]
    fn test_start_offset() {
        let spec = VehicleSpec {
            id: 2,
            route: route(&["A", "B"]),
            start_offset: 0.2,
            ..VehicleSpec::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let v = Vehicle::new(spec, &network(), &mut rng).unwrap();
        assert!(approx(v.position.x, 10.0));
        assert!(approx(v.remaining_segment, 40.0));
    }

    #[test]
    fn test_setup_errors() {
        let net = network();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let slow = VehicleSpec { id: 3, route: route(&["A", "B"]), max_speed: 0.0, ..VehicleSpec::default() };
        assert_eq!(Vehicle::new(slow, &net, &mut rng).unwrap_err(), SetupError::InvalidSpeed(3));

        let offset = VehicleSpec { id: 4, route: route(&["A", "B"]), start_offset: 1.0, ..VehicleSpec::default() };
        assert_eq!(Vehicle::new(offset, &net, &mut rng).unwrap_err(), SetupError::InvalidStartOffset(4));

        let skip = VehicleSpec { id: 5, route: route(&["A", "C"]), ..VehicleSpec::default() };
        assert!(matches!(
            Vehicle::new(skip, &net, &mut rng),
            Err(SetupError::MissingEdge { vehicle: 5, .. })
        ));
    }

    #[test]
    fn test_pseudonym_alphabet() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..50 {
            let p = generate_pseudonym(&mut rng);
            assert_eq!(p.len(), 6);
            assert!(p.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }

    // ─── Policy ─────────────────────────────────────────────────────────────

    #[test]
    fn test_energy_adaptation_ratchets() {
        let mut v = parked(Priority::TrafficUpdate, 4);
        v.energy = 20.0;
        v.apply_energy_adaptation();
        assert_eq!((v.priority, v.exigence), (Priority::Standard, 3));
        v.apply_energy_adaptation();
        assert_eq!((v.priority, v.exigence), (Priority::LowPriority, 2));
        v.apply_energy_adaptation();
        v.apply_energy_adaptation();
        assert_eq!((v.priority, v.exigence), (Priority::LowPriority, 1));
    }

    #[test]
    fn test_energy_adaptation_keeps_urgent() {
        let mut v = parked(Priority::Urgent, 3);
        v.energy = 29.9;
        v.apply_energy_adaptation();
        assert_eq!((v.priority, v.exigence), (Priority::Urgent, 2));

        let mut ample = parked(Priority::TrafficUpdate, 3);
        ample.apply_energy_adaptation();
        assert_eq!((ample.priority, ample.exigence), (Priority::TrafficUpdate, 3));
    }

    #[test]
    fn test_privacy_abstains_on_weak_antenna() {
        let mut v = parked(Priority::Standard, 3);
        v.privacy_aware = true;
        let mut weak = antenna(3);
        assert!(!v.attempt_connection(0, &mut weak));
        assert_eq!(weak.queue_len(), 0);

        let mut solid = antenna(4);
        assert!(v.attempt_connection(0, &mut solid));
        assert_eq!(solid.queue_len(), 1);
    }

    // ─── Connection completion ──────────────────────────────────────────────

    #[test]
    fn test_admission_outcomes() {
        let cases = [
            (Priority::Urgent, 5, 4, Outcome::Accepted),
            (Priority::Standard, 5, 5, Outcome::Rejected),
            (Priority::Standard, 5, 6, Outcome::Accepted),
            (Priority::TrafficUpdate, 5, 5, Outcome::Accepted),
            (Priority::LowPriority, 4, 4, Outcome::Rejected),
        ];
        for (priority, exigence, reliability, expected) in cases {
            let mut v = parked(priority, exigence);
            let mut a = antenna(reliability);
            let record = v.complete_connection(&mut a, 1, &ctx());
            assert_eq!(record.outcome, expected, "{:?} ex {} rel {}", priority, exigence, reliability);
            assert_eq!(a.congestion, 1);
        }
    }

    #[test]
    fn test_accepted_costs_and_time() {
        let mut v = parked(Priority::Standard, 5);
        let mut a = antenna(6);
        let record = v.complete_connection(&mut a, 1, &ctx());
        assert_eq!(record.outcome, Outcome::Accepted);
        assert!(approx(record.distance, 10.0));
        assert!(approx(record.cost, 3.0));
        // 1.5 * max(0.5, 1.5 - 0.9) * (1 + 0.2)
        assert!(approx(record.service_time, 1.08));
        assert!(approx(v.energy, 100.0 - 3.0 - 0.01));
        assert!(approx(v.connected_time, 1.08));
        assert_eq!(v.history.len(), 1);
    }

    #[test]
    fn test_rejected_charges_without_overhead() {
        let mut v = parked(Priority::Standard, 5);
        let mut a = antenna(5);
        let record = v.complete_connection(&mut a, 1, &ctx());
        assert_eq!(record.outcome, Outcome::Rejected);
        assert!(approx(v.energy, 97.0));
        assert_eq!(v.connected_time, 0.0);
    }

    #[test]
    fn test_energy_refusal_short_circuits() {
        let mut v = parked(Priority::Urgent, 3);
        v.energy = 4.0;
        let mut a = antenna(6);
        let record = v.complete_connection(&mut a, 1, &ctx());
        assert_eq!(record.outcome, Outcome::EnergyRefused);
        assert_eq!(record.cost, 0.0);
        assert_eq!(record.service_time, 0.0);
        assert_eq!(v.energy, 4.0);
        assert_eq!(a.congestion, 0);
        assert_eq!(a.schedule().total_pending(), 0);
        assert!(record.payload.is_some());
    }

    #[test]
    fn test_failure_outcome_on_offline_antenna() {
        let mut v = parked(Priority::Urgent, 3);
        let mut a = antenna(6);
        a.take_offline(2);
        let record = v.complete_connection(&mut a, 1, &ctx());
        assert_eq!(record.outcome, Outcome::Failure);
        assert_eq!(record.cost, FIXED_COST);
        assert_eq!(record.service_time, BASE_TIME);
        assert!(approx(v.energy, 100.0 - 2.0 - 0.01));
        assert_eq!(a.congestion, 0);
    }

    #[test]
    fn test_out_of_range_still_congests() {
        let spec = VehicleSpec { id: 8, ..VehicleSpec::default() };
        let mut v = Vehicle::stationary(spec, Point::new(1000.0, 0.0), "FAR001");
        let mut a = antenna(6);
        let record = v.complete_connection(&mut a, 1, &ctx());
        assert_eq!(record.outcome, Outcome::OutOfRange);
        assert_eq!(a.congestion, 1);
        assert!(approx(record.cost, 102.0));
        assert_eq!(v.energy, 0.0);
    }

    #[test]
    fn test_payload_opens_to_summary() {
        let ctx = ctx();
        let mut v = parked(Priority::Urgent, 3);
        let mut a = antenna(6);
        let record = v.complete_connection(&mut a, 1, &ctx);
        let text = ctx.open(record.payload.as_ref().unwrap()).unwrap();
        assert!(text.contains("Pseudonym: PARK01"));
        assert!(text.contains("Outcome: Accepted"));
    }

    // ─── Relay ──────────────────────────────────────────────────────────────

    #[test]
    fn test_relay_in_range() {
        let mut relay = parked(Priority::Standard, 3);
        let mut peer = parked(Priority::Standard, 3);
        let a = antenna(4);
        assert!(relay.relay(&mut peer, &a, 2));
        assert_eq!(peer.relays_received.len(), 1);
        assert_eq!(peer.relays_received[0].relay_pseudonym, "PARK01");
        assert!(approx(relay.energy, 99.99));
    }

    #[test]
    fn test_relay_refused_when_detected_or_offline() {
        let mut relay = parked(Priority::Standard, 3);
        let mut peer = parked(Priority::Standard, 3);
        let mut a = antenna(4);
        relay.detection = Detection::Detected;
        assert!(!relay.relay(&mut peer, &a, 2));

        relay.detection = Detection::Undetected;
        a.take_offline(1);
        assert!(!relay.relay(&mut peer, &a, 2));
        assert!(peer.relays_received.is_empty());
        assert_eq!(relay.energy, 100.0);
    }

    // ─── Espionage ──────────────────────────────────────────────────────────

    #[test]
    fn test_intercept_until_detected() {
        let ctx = ctx();
        let mut spy = parked(Priority::Standard, 3);
        spy.malicious = true;
        let mut victim = parked(Priority::Urgent, 3);
        assert_eq!(spy.intercept(&victim, 1), Ok(InterceptOutcome::NothingToRead));

        victim.complete_connection(&mut antenna(6), 1, &ctx);
        assert_eq!(
            spy.intercept(&victim, 2),
            Ok(InterceptOutcome::Intercepted { detected_now: false })
        );
        assert!(!spy.is_detected());
        assert_eq!(
            spy.intercept(&victim, 3),
            Ok(InterceptOutcome::Intercepted { detected_now: true })
        );
        assert!(spy.is_detected());
        assert_eq!(spy.intercept(&victim, 4), Ok(InterceptOutcome::Inactive));
        assert_eq!(spy.intercepted.len(), 2);
        assert_eq!(spy.suspicion_score, 2);
    }

    #[test]
    fn test_honest_vehicle_never_intercepts() {
        let mut honest = parked(Priority::Standard, 3);
        let mut victim = parked(Priority::Urgent, 3);
        victim.complete_connection(&mut antenna(6), 1, &ctx());
        assert_eq!(honest.intercept(&victim, 1), Ok(InterceptOutcome::Inactive));
        assert!(honest.intercepted.is_empty());
    }

    #[test]
    fn test_missing_payload_is_reported() {
        let mut spy = parked(Priority::Standard, 3);
        spy.malicious = true;
        let mut victim = parked(Priority::Urgent, 3);
        victim.complete_connection(&mut antenna(6), 1, &ctx());
        victim.history[0].payload = None;
        assert_eq!(
            spy.intercept(&victim, 2),
            Err(SimError::MissingPayload { victim: "PARK01".to_string() })
        );
        assert_eq!(spy.suspicion_score, 0);
        assert!(spy.intercepted.is_empty());
        assert!(!spy.is_detected());

        // The attempt is still noticed by the victim.
        victim.suspect(&spy.pseudonym);
        assert_eq!(victim.suspected_peers.get("PARK01"), Some(&1));
    }

    #[test]
    fn test_suspect_tallies_per_peer() {
        let mut v = parked(Priority::Standard, 3);
        v.suspect("SPY001");
        v.suspect("SPY001");
        v.suspect("SPY002");
        assert_eq!(v.suspected_peers.get("SPY001"), Some(&2));
        assert_eq!(v.suspected_peers.get("SPY002"), Some(&1));
    }

    // ─── V2V ────────────────────────────────────────────────────────────────

    #[test]
    fn test_advisory_lists_weak_accepting_antennas() {
        let ctx = ctx();
        let mut v = parked(Priority::Urgent, 3);
        assert!(v.advisory().is_none());

        let mut weak = Antenna::new(4, 3, Point::new(0.0, 0.0), AntennaClass::Local);
        let mut strong = Antenna::new(5, 6, Point::new(0.0, 0.0), AntennaClass::Local);
        v.complete_connection(&mut weak, 1, &ctx);
        v.complete_connection(&mut strong, 1, &ctx);
        v.complete_connection(&mut weak, 2, &ctx);

        let advisory = v.advisory().unwrap();
        assert_eq!(advisory.sender, "PARK01");
        assert_eq!(advisory.antenna_ids, vec![4]);
    }

    #[test]
    fn test_advisories_reset_priority() {
        for start in [Priority::Urgent, Priority::TrafficUpdate, Priority::LowPriority] {
            let mut v = parked(start, 3);
            v.receive_advisory(Advisory { sender: "X".into(), antenna_ids: vec![1] });
            v.receive_advisory(Advisory { sender: "Y".into(), antenna_ids: vec![2] });
            assert_eq!(v.process_advisories(), 2);
            assert_eq!(v.priority, Priority::Standard);
            assert_eq!(v.inbox_len(), 0);
        }
        let mut quiet = parked(Priority::Urgent, 3);
        assert_eq!(quiet.process_advisories(), 0);
        assert_eq!(quiet.priority, Priority::Urgent);
    }

    #[test]
    fn test_service_time_reliability_floor() {
        // reliability 9 would give a negative factor; clamped to 0.5
        assert!(approx(service_time(0.0, 9, 0), 0.5));
        assert!(approx(service_time(0.0, 3, 0), 1.5));
    }

    // ─── Properties ─────────────────────────────────────────────────────────

    proptest! {
        #[test]
        fn energy_never_increases(
            speed in 1.0f64..40.0,
            reliability in 1i32..8,
            steps in 1usize..60,
        ) {
            let ctx = ctx();
            let mut v = driving(&["A", "B", "C"], speed);
            let mut a = antenna(reliability);
            let mut last = v.energy;
            for tick in 1..=steps as u64 {
                v.move_step();
                prop_assert!(v.energy <= last && v.energy >= 0.0);
                last = v.energy;
                v.apply_energy_adaptation();
                v.complete_connection(&mut a, tick, &ctx);
                prop_assert!(v.energy <= last && v.energy >= 0.0);
                last = v.energy;
                a.decay_congestion(tick);
            }
        }

        #[test]
        fn adaptation_never_raises_priority(exigence in 1i32..7, rounds in 1usize..10) {
            let mut v = parked(Priority::TrafficUpdate, exigence);
            v.energy = 10.0;
            for _ in 0..rounds {
                let rank = v.priority.rank();
                v.apply_energy_adaptation();
                prop_assert!(v.priority.rank() <= rank);
                prop_assert!(v.exigence >= 1);
            }
        }
    }
}
