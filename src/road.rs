// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Roadlink V2X Simulation Suite - Road Network

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::SetupError;
use crate::types::{Point, RoadClass};

/// A directed road segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub distance: f64,
    pub class: RoadClass,
}

/// Static road graph. Read-only once a simulation is running.
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    intersections: BTreeMap<String, Point>,
    edges: HashMap<(String, String), Edge>,
    speed_limits: BTreeMap<RoadClass, f64>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_intersection(&mut self, id: impl Into<String>, position: Point) {
        self.intersections.insert(id.into(), position);
    }

    /// Add a one-way edge `from -> to`.
    pub fn add_edge(&mut self, from: &str, to: &str, distance: f64, class: RoadClass) {
        self.edges
            .insert((from.to_string(), to.to_string()), Edge { distance, class });
    }

    /// Add a two-way road. An already declared reverse direction is kept.
    pub fn add_road(&mut self, a: &str, b: &str, distance: f64, class: RoadClass) {
        self.add_edge(a, b, distance, class);
        self.edges
            .entry((b.to_string(), a.to_string()))
            .or_insert(Edge { distance, class });
    }

    pub fn set_speed_limit(&mut self, class: RoadClass, limit: f64) {
        self.speed_limits.insert(class, limit);
    }

    pub fn intersection(&self, id: &str) -> Option<Point> {
        self.intersections.get(id).copied()
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&Edge> {
        self.edges.get(&(from.to_string(), to.to_string()))
    }

    pub fn speed_limit(&self, class: RoadClass) -> Option<f64> {
        self.speed_limits.get(&class).copied()
    }

    pub fn intersection_count(&self) -> usize {
        self.intersections.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Check that every edge joins known intersections, has a positive
    /// length, and that its class carries a speed limit.
    pub fn validate(&self) -> Result<(), SetupError> {
        let mut keys: Vec<&(String, String)> = self.edges.keys().collect();
        keys.sort();
        for key in keys {
            let (from, to) = key;
            for node in [from, to] {
                if !self.intersections.contains_key(node) {
                    return Err(SetupError::UnknownIntersection(node.clone()));
                }
            }
            let edge = &self.edges[key];
            if !(edge.distance > 0.0) {
                return Err(SetupError::InvalidEdgeDistance {
                    from: from.clone(),
                    to: to.clone(),
                    distance: edge.distance,
                });
            }
            match self.speed_limit(edge.class) {
                Some(limit) if limit > 0.0 => {}
                _ => return Err(SetupError::MissingSpeedLimit(edge.class)),
            }
        }
        Ok(())
    }

    /// Check that a route only visits known intersections and that each
    /// consecutive step follows an existing edge.
    pub fn validate_route(&self, vehicle_id: u32, route: &[String]) -> Result<(), SetupError> {
        if route.is_empty() {
            return Err(SetupError::EmptyRoute(vehicle_id));
        }
        for node in route {
            if !self.intersections.contains_key(node) {
                return Err(SetupError::UnknownIntersection(node.clone()));
            }
        }
        for step in route.windows(2) {
            if self.edge(&step[0], &step[1]).is_none() {
                return Err(SetupError::MissingEdge {
                    vehicle: vehicle_id,
                    from: step[0].clone(),
                    to: step[1].clone(),
                });
            }
        }
        Ok(())
    }
}
