// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Reference Scenario
//
// The five-intersection loop and the randomized antenna/vehicle pools used
// when no scenario file is given.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{
    AntennaSpec, IntersectionConfig, RoadConfig, ScenarioConfig, SpeedLimitConfig, DEFAULT_TICKS,
};
use crate::antenna::FAILURE_PROBABILITY;
use crate::types::{AntennaClass, EnergyType, Priority, RoadClass};
use crate::vehicle::VehicleSpec;

pub const ANTENNA_COUNT: u32 = 6;
pub const VEHICLE_COUNT: u32 = 15;
pub const MALICIOUS_SHARE: f64 = 0.3;
/// Side of the square antennas are scattered over.
pub const ZONE_SIZE: u32 = 100;

/// Routes vehicles are drawn from.
pub const CANONICAL_PATHS: [&[&str]; 5] = [
    &["A", "B", "C", "D", "E"],
    &["A", "E", "D", "C", "B"],
    &["A", "B", "C"],
    &["C", "B", "A", "E"],
    &["E", "D", "C", "B"],
];

const INITIAL_PRIORITIES: [Priority; 3] =
    [Priority::Urgent, Priority::TrafficUpdate, Priority::Standard];

pub fn intersections() -> Vec<IntersectionConfig> {
    [("A", 10.0, 10.0), ("B", 80.0, 10.0), ("C", 80.0, 50.0), ("D", 50.0, 80.0), ("E", 10.0, 80.0)]
        .into_iter()
        .map(|(id, x, y)| IntersectionConfig { id: id.to_string(), x, y })
        .collect()
}

pub fn roads() -> Vec<RoadConfig> {
    [
        ("A", "B", 70.0, RoadClass::Highway),
        ("B", "C", 40.0, RoadClass::Primary),
        ("C", "D", 40.0, RoadClass::Secondary),
        ("D", "E", 50.0, RoadClass::Primary),
        ("A", "E", 70.0, RoadClass::Secondary),
    ]
    .into_iter()
    .map(|(from, to, distance, class)| RoadConfig {
        from: from.to_string(),
        to: to.to_string(),
        distance,
        class,
        bidirectional: true,
    })
    .collect()
}

pub fn speed_limits() -> Vec<SpeedLimitConfig> {
    vec![
        SpeedLimitConfig { class: RoadClass::Highway, limit: 130.0 },
        SpeedLimitConfig { class: RoadClass::Primary, limit: 80.0 },
        SpeedLimitConfig { class: RoadClass::Secondary, limit: 50.0 },
    ]
}

/// The road layout with no antennas or vehicles.
pub fn base_scenario(seed: u64) -> ScenarioConfig {
    ScenarioConfig {
        seed,
        ticks: DEFAULT_TICKS,
        key: None,
        intersections: intersections(),
        roads: roads(),
        speed_limits: speed_limits(),
        antennas: Vec::new(),
        vehicles: Vec::new(),
    }
}

/// Reference scenario with antenna and vehicle pools drawn from `seed`.
pub fn random_scenario(seed: u64) -> ScenarioConfig {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut config = base_scenario(seed);

    config.antennas = (1..=ANTENNA_COUNT)
        .map(|id| AntennaSpec {
            id,
            reliability: rng.gen_range(3..=6),
            x: rng.gen_range(0..=ZONE_SIZE) as f64,
            y: rng.gen_range(0..=ZONE_SIZE) as f64,
            class: if id % 2 == 0 { AntennaClass::Local } else { AntennaClass::LongRange },
            failure_probability: FAILURE_PROBABILITY,
        })
        .collect();

    config.vehicles = (1..=VEHICLE_COUNT)
        .map(|id| {
            let path = CANONICAL_PATHS[rng.gen_range(0..CANONICAL_PATHS.len())];
            let malicious = rng.gen::<f64>() < MALICIOUS_SHARE;
            let max_speed = rng.gen_range(3.0..7.0);
            let energy_type = if rng.gen_bool(0.5) { EnergyType::Electric } else { EnergyType::Thermal };
            let privacy_aware = rng.gen_bool(0.5);
            let exigence = rng.gen_range(3..=6);
            let priority = INITIAL_PRIORITIES[rng.gen_range(0..INITIAL_PRIORITIES.len())];
            let start_offset = rng.gen_range(0.0..0.3);
            VehicleSpec {
                id,
                route: path.iter().map(|n| n.to_string()).collect(),
                max_speed,
                priority,
                exigence,
                malicious,
                privacy_aware,
                energy_type,
                start_offset,
            }
        })
        .collect();

    config
}
