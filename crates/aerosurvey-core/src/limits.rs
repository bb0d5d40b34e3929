//! Planning thresholds for pattern generation and mission creation.

use serde::{Deserialize, Serialize};

/// Validation limits applied when planning a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanningLimits {
    /// Hard cap on generated waypoints per mission
    pub max_waypoints: usize,
    /// Minimum vertices a boundary polygon must have
    pub min_boundary_vertices: usize,
    /// Maximum allowed altitude in meters
    pub max_altitude_m: f64,
    /// Maximum allowed cruise speed in m/s
    pub max_speed_mps: f64,
}

impl Default for PlanningLimits {
    fn default() -> Self {
        Self {
            max_waypoints: 1000,
            min_boundary_vertices: 3,
            max_altitude_m: 121.0, // FAA Part 107 limit (~400ft)
            max_speed_mps: 25.0,
        }
    }
}
