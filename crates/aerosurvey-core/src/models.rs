//! Core data models for the survey mission engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single targeted position a mission visits in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Waypoint {
    pub lat: f64,
    pub lon: f64,
    pub altitude_m: f64,
    /// 1-based sequence index, dense with no gaps.
    pub order: u32,
    #[serde(default)]
    pub action: WaypointAction,
    #[serde(default)]
    pub speed_mps: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaypointAction {
    /// Ordinary fly-through point
    #[default]
    Waypoint,
    /// Synthetic leading point at the launch position
    Takeoff,
    /// Synthetic trailing point at the recovery position
    Land,
    /// Hold position
    Hover,
    /// Trigger the camera
    Capture,
}

/// Flight pattern used to cover a boundary polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternType {
    /// Boustrophedon sweep along latitude rows
    Grid,
    /// Two grid passes at 90 degrees, appended
    Crosshatch,
    /// Boundary vertices in their given order
    Perimeter,
    /// Outward Archimedean spiral from the boundary centroid
    Spiral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissionStatus {
    /// Created, drone assigned, not yet flying
    Planned,
    /// Actively executing waypoints
    InProgress,
    /// Temporarily halted, drone hovering
    Paused,
    /// Finished all waypoints, statistics recorded
    Completed,
    /// Terminated early by operator or failsafe
    Aborted,
}

impl MissionStatus {
    /// Completed and Aborted accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Aborted)
    }

    /// InProgress and Paused occupy the drone.
    pub fn is_active(&self) -> bool {
        matches!(self, MissionStatus::InProgress | MissionStatus::Paused)
    }
}

impl fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MissionStatus::Planned => "planned",
            MissionStatus::InProgress => "in-progress",
            MissionStatus::Paused => "paused",
            MissionStatus::Completed => "completed",
            MissionStatus::Aborted => "aborted",
        };
        write!(f, "{label}")
    }
}

/// A survey flight over a boundary polygon, bound to exactly one drone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub mission_id: String,
    /// Parent survey, if this mission is one slice of a larger job.
    #[serde(default)]
    pub survey_id: Option<String>,
    pub drone_id: String,
    pub pattern: PatternType,
    pub status: MissionStatus,
    /// Immutable once the mission leaves Planned.
    pub waypoints: Vec<Waypoint>,
    pub speed_mps: f64,
    /// Percent complete in [0, 100].
    pub progress: f64,
    pub current_waypoint_index: usize,
    pub estimated_duration_min: Option<f64>,
    pub estimated_time_remaining_min: Option<f64>,
    pub start_time: Option<DateTime<Utc>>,
    /// Set while paused, cleared on resume and on terminal transitions.
    pub pause_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    /// Present iff the mission completed.
    pub statistics: Option<MissionStatistics>,
    /// Present iff the mission aborted.
    pub abort_reason: Option<String>,
    /// Latest merged telemetry snapshot.
    #[serde(default)]
    pub telemetry: Option<TelemetrySnapshot>,
    pub created_at: DateTime<Utc>,
}

/// Request to plan a new mission from generated waypoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionRequest {
    pub drone_id: String,
    #[serde(default)]
    pub survey_id: Option<String>,
    pub pattern: PatternType,
    pub waypoints: Vec<Waypoint>,
    /// Cruise speed; falls back to the engine default when omitted.
    #[serde(default)]
    pub speed_mps: Option<f64>,
}

/// Post-flight numbers computed when a mission completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionStatistics {
    pub distance_km: f64,
    pub area_covered_km2: f64,
    pub duration_min: f64,
    #[serde(default)]
    pub battery_used: Option<f64>,
    #[serde(default)]
    pub images: Option<u32>,
    #[serde(default)]
    pub videos: Option<u32>,
}

/// Caller-supplied metadata accompanying a completion request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionReport {
    /// Percent of battery consumed over the flight.
    #[serde(default)]
    pub battery_used: Option<f64>,
    #[serde(default)]
    pub images: Option<u32>,
    #[serde(default)]
    pub videos: Option<u32>,
}

/// Progress report for an in-progress mission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Percent complete in [0, 100].
    pub progress: f64,
    #[serde(default)]
    pub current_waypoint_index: Option<usize>,
    #[serde(default)]
    pub telemetry: Option<TelemetryUpdate>,
}

// ========== DRONE MODELS ==========

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroneStatus {
    /// Idle, ready for assignment
    #[default]
    Available,
    /// Bound to a planned mission
    Assigned,
    /// Executing a mission
    Flying,
    /// Holding position (mission paused)
    Hovering,
    /// Returning to home after abort/completion
    Returning,
    /// Grounded for service
    Maintenance,
    /// Lost communication
    Offline,
    /// Hardware fault
    Error,
}

impl DroneStatus {
    /// Statuses under which a drone carries a mission reference.
    pub fn is_mission_bound(&self) -> bool {
        matches!(
            self,
            DroneStatus::Assigned
                | DroneStatus::Flying
                | DroneStatus::Hovering
                | DroneStatus::Returning
        )
    }
}

impl fmt::Display for DroneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DroneStatus::Available => "available",
            DroneStatus::Assigned => "assigned",
            DroneStatus::Flying => "flying",
            DroneStatus::Hovering => "hovering",
            DroneStatus::Returning => "returning",
            DroneStatus::Maintenance => "maintenance",
            DroneStatus::Offline => "offline",
            DroneStatus::Error => "error",
        };
        write!(f, "{label}")
    }
}

/// Current state of a registered drone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Drone {
    pub drone_id: String,
    pub status: DroneStatus,
    /// Non-null iff status is assigned/flying/hovering/returning.
    pub current_mission: Option<String>,
    /// Percent in [0, 100].
    pub battery_level: f64,
    /// Accumulated flight time; only ever increases.
    pub flight_hours: f64,
    pub last_update: DateTime<Utc>,
}

impl Drone {
    /// Create a fresh drone record, available with a full battery.
    pub fn new(drone_id: impl Into<String>) -> Self {
        Self {
            drone_id: drone_id.into(),
            status: DroneStatus::Available,
            current_mission: None,
            battery_level: 100.0,
            flight_hours: 0.0,
            last_update: Utc::now(),
        }
    }
}

// ========== TELEMETRY MODELS ==========

/// Telemetry payload received from a drone mid-flight.
///
/// All position fields are optional; a payload may carry any subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryUpdate {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub altitude_m: Option<f64>,
    #[serde(default)]
    pub speed_mps: Option<f64>,
    #[serde(default)]
    pub heading_deg: Option<f64>,
    #[serde(default)]
    pub battery_level: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Latest merged telemetry for a mission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub altitude_m: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
    pub battery_level: Option<f64>,
    /// Timestamp of the newest payload merged in.
    pub timestamp: DateTime<Utc>,
    /// When the engine accepted that payload.
    pub received_at: DateTime<Utc>,
}

impl TelemetrySnapshot {
    /// Create a snapshot from the first payload of a flight.
    pub fn from_update(update: &TelemetryUpdate) -> Self {
        Self {
            lat: update.lat,
            lon: update.lon,
            altitude_m: update.altitude_m,
            speed_mps: update.speed_mps,
            heading_deg: update.heading_deg,
            battery_level: update.battery_level,
            timestamp: update.timestamp,
            received_at: Utc::now(),
        }
    }

    /// Merge a newer payload into the snapshot, keeping fields the
    /// payload did not carry. Returns false (and changes nothing) when
    /// the payload is older than what is already stored.
    pub fn merge(&mut self, update: &TelemetryUpdate) -> bool {
        if update.timestamp < self.timestamp {
            return false;
        }
        if update.lat.is_some() {
            self.lat = update.lat;
        }
        if update.lon.is_some() {
            self.lon = update.lon;
        }
        if update.altitude_m.is_some() {
            self.altitude_m = update.altitude_m;
        }
        if update.speed_mps.is_some() {
            self.speed_mps = update.speed_mps;
        }
        if update.heading_deg.is_some() {
            self.heading_deg = update.heading_deg;
        }
        if update.battery_level.is_some() {
            self.battery_level = update.battery_level;
        }
        self.timestamp = update.timestamp;
        self.received_at = Utc::now();
        true
    }
}

// ========== SURVEY MODELS ==========

/// Parent record grouping the missions that cover one survey job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Survey {
    pub survey_id: String,
    pub name: String,
    /// Set once every child mission has reached a terminal state.
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Survey {
    pub fn new(survey_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            survey_id: survey_id.into(),
            name: name.into(),
            completed: false,
            created_at: Utc::now(),
        }
    }
}
