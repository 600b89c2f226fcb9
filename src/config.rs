// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Scenario Configuration

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::antenna::{Antenna, FAILURE_PROBABILITY};
use crate::confidentiality::ConfidentialityContext;
use crate::error::{ConfigError, SetupError};
use crate::road::RoadNetwork;
use crate::simulation::SimulationEngine;
use crate::types::{AntennaClass, Point, RoadClass};
use crate::vehicle::{Vehicle, VehicleSpec};

pub const DEFAULT_TICKS: u64 = 20;

fn default_ticks() -> u64 { DEFAULT_TICKS }
fn default_bidirectional() -> bool { true }
fn default_failure_probability() -> f64 { FAILURE_PROBABILITY }

// ─── Scenario pieces ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionConfig {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadConfig {
    pub from: String,
    pub to: String,
    pub distance: f64,
    pub class: RoadClass,
    #[serde(default = "default_bidirectional")]
    pub bidirectional: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedLimitConfig {
    pub class: RoadClass,
    pub limit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntennaSpec {
    pub id: u32,
    pub reliability: i32,
    pub x: f64,
    pub y: f64,
    pub class: AntennaClass,
    #[serde(default = "default_failure_probability")]
    pub failure_probability: f64,
}

impl AntennaSpec {
    pub fn build(&self) -> Antenna {
        let mut antenna = Antenna::new(self.id, self.reliability, Point::new(self.x, self.y), self.class);
        antenna.failure_probability = self.failure_probability;
        antenna
    }
}

// ─── ScenarioConfig ──────────────────────────────────────────────────────────

/// Everything needed to build an engine. A seed fully determines the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_ticks")]
    pub ticks: u64,
    /// Hex-encoded 32-byte sealing key. Drawn from the seed when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub intersections: Vec<IntersectionConfig>,
    pub roads: Vec<RoadConfig>,
    pub speed_limits: Vec<SpeedLimitConfig>,
    #[serde(default)]
    pub antennas: Vec<AntennaSpec>,
    #[serde(default)]
    pub vehicles: Vec<VehicleSpec>,
}

impl ScenarioConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn road_network(&self) -> RoadNetwork {
        let mut network = RoadNetwork::new();
        for node in &self.intersections {
            network.add_intersection(node.id.clone(), Point::new(node.x, node.y));
        }
        for road in &self.roads {
            if road.bidirectional {
                network.add_road(&road.from, &road.to, road.distance, road.class);
            } else {
                network.add_edge(&road.from, &road.to, road.distance, road.class);
            }
        }
        for limit in &self.speed_limits {
            network.set_speed_limit(limit.class, limit.limit);
        }
        network
    }

    /// Reject a scenario the engine must never start with.
    pub fn validate(&self) -> Result<(), SetupError> {
        let network = self.road_network();
        network.validate()?;

        let mut antenna_ids = BTreeSet::new();
        for antenna in &self.antennas {
            if !antenna_ids.insert(antenna.id) {
                return Err(SetupError::DuplicateAntenna(antenna.id));
            }
            if !(0.0..=1.0).contains(&antenna.failure_probability) {
                return Err(SetupError::InvalidFailureProbability(antenna.id));
            }
        }

        let mut vehicle_ids = BTreeSet::new();
        for vehicle in &self.vehicles {
            if !vehicle_ids.insert(vehicle.id) {
                return Err(SetupError::DuplicateVehicle(vehicle.id));
            }
            network.validate_route(vehicle.id, &vehicle.route)?;
            if !(vehicle.max_speed > 0.0) {
                return Err(SetupError::InvalidSpeed(vehicle.id));
            }
            if !(0.0..1.0).contains(&vehicle.start_offset) {
                return Err(SetupError::InvalidStartOffset(vehicle.id));
            }
        }

        if let Some(key) = &self.key {
            parse_key(key)?;
        }
        Ok(())
    }

    /// Validate and wire up an engine. The sealing key, then each vehicle's
    /// pseudonym, are drawn from the seeded source before the first tick.
    pub fn build(&self) -> Result<SimulationEngine, SetupError> {
        self.validate()?;
        let network = self.road_network();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let ctx = match &self.key {
            Some(key) => ConfidentialityContext::from_key(parse_key(key)?),
            None => ConfidentialityContext::generate(&mut rng),
        };
        let antennas = self.antennas.iter().map(AntennaSpec::build).collect();
        let vehicles = self
            .vehicles
            .iter()
            .cloned()
            .map(|spec| Vehicle::new(spec, &network, &mut rng))
            .collect::<Result<Vec<_>, _>>()?;

        SimulationEngine::assemble(self.seed, network, antennas, vehicles, Arc::new(ctx), rng)
    }
}

fn parse_key(key: &str) -> Result<[u8; 32], SetupError> {
    let bytes = hex::decode(key.trim()).map_err(|e| SetupError::InvalidKey(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| SetupError::InvalidKey(format!("expected 32 bytes, got {}", b.len())))
}
