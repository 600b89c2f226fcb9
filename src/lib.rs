// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite

pub mod types;
pub mod error;
pub mod confidentiality;
pub mod congestion;
pub mod road;
pub mod antenna;
pub mod vehicle;
pub mod simulation;
pub mod config;
pub mod scenario;
pub mod stats;

pub use types::*;
pub use error::{ConfigError, SetupError, SimError};
pub use confidentiality::{ConfidentialityContext, ConfidentialityError, SealedToken};
pub use road::RoadNetwork;
pub use antenna::Antenna;
pub use vehicle::{InterceptOutcome, Vehicle, VehicleSpec};
pub use simulation::SimulationEngine;
pub use config::ScenarioConfig;
pub use stats::RunStats;

use wasm_bindgen::prelude::*;

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl SimulationEngine {
    /// Engine over the reference scenario drawn from `seed`.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<SimulationEngine, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        scenario::random_scenario(seed)
            .build()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    pub fn tick(&mut self) -> JsValue {
        let result = self.tick_core();
        serde_wasm_bindgen::to_value(&result).unwrap_or(JsValue::NULL)
    }

    /// Run N ticks without returning results
    pub fn run_batch(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick_core();
        }
    }

    pub fn get_antennas(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.antennas).unwrap_or(JsValue::NULL)
    }

    pub fn get_vehicles(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.vehicles).unwrap_or(JsValue::NULL)
    }

    pub fn get_stats(&self) -> JsValue {
        let stats = RunStats::from_summary(&self.summary(), &self.vehicles);
        serde_wasm_bindgen::to_value(&stats).unwrap_or(JsValue::NULL)
    }

    pub fn get_tick(&self) -> u64 {
        self.current_tick
    }

    pub fn kill_antenna(&mut self, antenna_id: u32, ticks: u32) -> bool {
        self.take_antenna_offline(antenna_id, ticks)
    }

    /// Reset simulation to its initial state
    pub fn reset(&mut self) -> Result<(), JsValue> {
        *self = SimulationEngine::new(self.seed)?;
        Ok(())
    }
}
