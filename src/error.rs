// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Errors

use crate::types::RoadClass;

// ---------------------------------------------------------------------------
// Setup errors (fatal, raised before the first tick)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SetupError {
    #[error("unknown intersection `{0}`")]
    UnknownIntersection(String),
    #[error("edge {from} -> {to} has invalid distance {distance}")]
    InvalidEdgeDistance { from: String, to: String, distance: f64 },
    #[error("no speed limit configured for road class {0:?}")]
    MissingSpeedLimit(RoadClass),
    #[error("vehicle {0} has an empty route")]
    EmptyRoute(u32),
    #[error("vehicle {vehicle}: no road edge {from} -> {to}")]
    MissingEdge { vehicle: u32, from: String, to: String },
    #[error("vehicle {0} has a non-positive speed")]
    InvalidSpeed(u32),
    #[error("vehicle {0} has a start offset outside [0, 1)")]
    InvalidStartOffset(u32),
    #[error("antenna {0} has a failure probability outside [0, 1]")]
    InvalidFailureProbability(u32),
    #[error("duplicate antenna id {0}")]
    DuplicateAntenna(u32),
    #[error("duplicate vehicle id {0}")]
    DuplicateVehicle(u32),
    #[error("invalid sealing key: {0}")]
    InvalidKey(String),
}

// ---------------------------------------------------------------------------
// Runtime data-integrity errors (logged, never abort a run)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("connection record of `{victim}` carries no sealed payload")]
    MissingPayload { victim: String },
}

// ---------------------------------------------------------------------------
// Scenario file errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scenario file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid scenario: {0}")]
    Setup(#[from] SetupError),
}
