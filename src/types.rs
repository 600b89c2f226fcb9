// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Type Definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::confidentiality::SealedToken;

// ─── Point ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Point at `ratio` of the way from `self` to `to`.
    pub fn lerp(&self, to: &Point, ratio: f64) -> Point {
        Point {
            x: self.x + ratio * (to.x - self.x),
            y: self.y + ratio * (to.y - self.y),
        }
    }
}

// ─── Priority ────────────────────────────────────────────────────────────────

/// Access class of a vehicle, highest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Priority {
    Urgent = 0,
    TrafficUpdate = 1,
    Standard = 2,
    LowPriority = 3,
}

impl Default for Priority {
    fn default() -> Self { Priority::Standard }
}

impl Priority {
    /// Queue rank used by antennas; larger is served first.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Urgent => 3,
            Self::TrafficUpdate => 2,
            Self::Standard => 1,
            Self::LowPriority => 0,
        }
    }

    /// One-step downgrade applied under low energy.
    pub fn downgraded(&self) -> Self {
        match self {
            Self::TrafficUpdate => Self::Standard,
            Self::Standard => Self::LowPriority,
            Self::Urgent => Self::Urgent,
            Self::LowPriority => Self::LowPriority,
        }
    }

    /// Whether an antenna of `reliability` satisfies a vehicle of this class
    /// demanding `exigence`.
    pub fn admits(&self, exigence: i32, reliability: i32) -> bool {
        match self {
            Self::Urgent => reliability >= exigence - 1,
            Self::TrafficUpdate => reliability >= exigence,
            Self::Standard | Self::LowPriority => reliability > exigence,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Urgent => "Urgent",
            Self::TrafficUpdate => "TrafficUpdate",
            Self::Standard => "Standard",
            Self::LowPriority => "LowPriority",
        };
        f.write_str(label)
    }
}

// ─── Energy Type ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EnergyType {
    Electric = 0,
    Thermal = 1,
}

impl EnergyType {
    /// Energy spent per unit of distance driven.
    pub fn base_rate(&self) -> f64 {
        match self {
            Self::Electric => 0.05,
            Self::Thermal => 0.1,
        }
    }

    /// Energy overhead of one connection, relay or failed attempt.
    pub fn connection_rate(&self) -> f64 {
        match self {
            Self::Electric => 0.01,
            Self::Thermal => 0.02,
        }
    }

    pub fn initial_energy(&self) -> f64 {
        match self {
            Self::Electric => 100.0,
            Self::Thermal => 80.0,
        }
    }
}

// ─── Antenna Class ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AntennaClass {
    Local = 0,
    LongRange = 1,
}

impl AntennaClass {
    pub fn base_range(&self) -> f64 {
        match self {
            Self::Local => 300.0,
            Self::LongRange => 600.0,
        }
    }
}

// ─── Road Class ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RoadClass {
    Highway = 0,
    Primary = 1,
    Secondary = 2,
}

// ─── Availability / Route / Detection ────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Availability {
    Available = 0,
    Failed = 1,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RouteState {
    InTransit = 0,
    Completed = 1, // TERMINAL
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Detection {
    Undetected = 0,
    Detected = 1, // TERMINAL
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Outcome {
    Accepted = 0,
    Rejected = 1,
    OutOfRange = 2,
    Failure = 3,
    EnergyRefused = 4,
}

impl Outcome {
    /// Refusals as the reporting layer groups them (policy or energy).
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::Rejected | Self::EnergyRefused)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::OutOfRange => "OutOfRange",
            Self::Failure => "Failure",
            Self::EnergyRefused => "EnergyRefused",
        };
        f.write_str(label)
    }
}

// ─── ConnectionRecord ────────────────────────────────────────────────────────

/// One completed connection attempt. Never mutated once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub tick: u64,
    pub vehicle_id: u32,
    pub pseudonym: String,
    pub energy_type: EnergyType,
    pub malicious: bool,
    pub detected: bool,
    pub suspicion_score: u32,
    pub priority: Priority,
    pub exigence: i32,
    pub initial_energy: f64,
    pub energy_remaining: f64,
    pub antenna_id: u32,
    pub antenna_reliability: i32,
    pub antenna_congestion: u32,
    pub outcome: Outcome,
    pub distance: f64,
    pub service_time: f64,
    pub cost: f64,
    #[serde(default)]
    pub payload: Option<SealedToken>,
}

// ─── Relay / Interception / Advisory ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayRecord {
    pub tick: u64,
    pub antenna_id: u32,
    pub relay_pseudonym: String,
    pub antenna_reliability: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptedRecord {
    pub tick: u64,
    pub victim_pseudonym: String,
    pub payload: SealedToken,
}

/// V2V notice naming antennas the sender found weak but usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub sender: String,
    pub antenna_ids: Vec<u32>,
}

// ─── TickResult ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct TickResult {
    pub tick: u64,
    pub records: Vec<ConnectionRecord>,
    /// Sum of antenna congestion after the antenna self-update pass.
    pub total_congestion: u32,
    pub interceptions: u32,
    pub failures: u32,
    pub newly_completed: Vec<String>,
    pub antenna_updates: Vec<AntennaUpdate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AntennaUpdate {
    pub id: u32,
    pub available: bool,
    pub congestion: u32,
    pub range: f64,
    pub admitted: u32,
}

// ─── Run Summary ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AntennaTally {
    pub failures: u32,
    pub congestion_increments: u32,
    pub final_congestion: u32,
    pub total_connections: u32,
    pub outcomes: BTreeMap<Outcome, u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub records: Vec<ConnectionRecord>,
    pub congestion_per_tick: Vec<u32>,
    pub interceptions_per_tick: Vec<u32>,
    pub completed: Vec<String>,
    pub antenna_tallies: BTreeMap<u32, AntennaTally>,
}
