pub mod error;
pub mod geo;
pub mod limits;
pub mod models;
pub mod path;
pub mod pattern;
pub mod stats;

pub use error::{Error, Result};
pub use geo::{
    bounding_box, haversine_distance, path_distance_m, rectangular_area_km2, shoelace_area_km2,
    BoundingBox, EARTH_RADIUS_KM, EARTH_RADIUS_M,
};
pub use limits::PlanningLimits;
pub use models::{
    CompletionReport, Drone, DroneStatus, Mission, MissionRequest, MissionStatistics,
    MissionStatus, PatternType, ProgressUpdate, Survey, TelemetrySnapshot, TelemetryUpdate,
    Waypoint, WaypointAction,
};
pub use path::optimize_route;
pub use pattern::{generate_pattern, generate_pattern_with_limits, PatternParams};
pub use stats::compute_statistics;
