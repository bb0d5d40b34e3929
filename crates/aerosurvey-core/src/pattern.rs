//! Waypoint pattern generators for covering a boundary polygon.
//!
//! All generators are stateless pure functions: boundary + parameters in,
//! ordered waypoint sequence out. Order numbering is 1-based and dense.

use crate::error::{Error, Result};
use crate::geo::{bounding_box, BoundingBox};
use crate::limits::PlanningLimits;
use crate::models::{PatternType, Waypoint, WaypointAction};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Parameters shared by every pattern generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternParams {
    /// Flight altitude applied to every generated waypoint.
    pub altitude_m: f64,
    /// Coverage overlap in percent; higher overlap means tighter spacing.
    pub overlap_percent: f64,
    /// Accepted for API compatibility; sweeps are axis-aligned and the
    /// crosshatch 90-degree pass is implemented as an axis swap.
    #[serde(default)]
    pub rotation_deg: f64,
    /// Cruise speed tagged onto each waypoint, if any.
    #[serde(default)]
    pub speed_mps: Option<f64>,
}

impl Default for PatternParams {
    fn default() -> Self {
        Self {
            altitude_m: 50.0,
            overlap_percent: 30.0,
            rotation_deg: 0.0,
            speed_mps: None,
        }
    }
}

/// Which axis a boustrophedon sweep steps between rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SweepAxis {
    /// Rows of constant latitude, stepped south to north
    Latitude,
    /// Rows of constant longitude, stepped west to east
    Longitude,
}

/// Generate an ordered waypoint sequence covering `boundary` with the
/// requested pattern, using default planning limits.
pub fn generate_pattern(
    pattern: PatternType,
    boundary: &[[f64; 2]],
    params: &PatternParams,
) -> Result<Vec<Waypoint>> {
    generate_pattern_with_limits(pattern, boundary, params, &PlanningLimits::default())
}

/// Generate an ordered waypoint sequence with explicit planning limits.
pub fn generate_pattern_with_limits(
    pattern: PatternType,
    boundary: &[[f64; 2]],
    params: &PatternParams,
    limits: &PlanningLimits,
) -> Result<Vec<Waypoint>> {
    validate_inputs(boundary, params, limits)?;

    let waypoints = match pattern {
        PatternType::Grid => generate_grid(boundary, params, limits),
        PatternType::Crosshatch => generate_crosshatch(boundary, params, limits),
        PatternType::Perimeter => generate_perimeter(boundary, params, limits),
        PatternType::Spiral => generate_spiral(boundary, params, limits),
    };
    Ok(waypoints)
}

fn validate_inputs(
    boundary: &[[f64; 2]],
    params: &PatternParams,
    limits: &PlanningLimits,
) -> Result<()> {
    if boundary.len() < limits.min_boundary_vertices {
        return Err(Error::Validation(format!(
            "boundary requires at least {} vertices, got {}",
            limits.min_boundary_vertices,
            boundary.len()
        )));
    }
    if boundary
        .iter()
        .any(|p| !p[0].is_finite() || !p[1].is_finite())
    {
        return Err(Error::Computation(
            "boundary contains non-finite coordinates".to_string(),
        ));
    }
    if !(params.altitude_m > 0.0) {
        return Err(Error::Validation(format!(
            "altitude must be positive, got {}",
            params.altitude_m
        )));
    }
    if params.altitude_m > limits.max_altitude_m {
        return Err(Error::Validation(format!(
            "altitude {}m exceeds ceiling {}m",
            params.altitude_m, limits.max_altitude_m
        )));
    }
    if !(0.0..100.0).contains(&params.overlap_percent) {
        return Err(Error::Validation(format!(
            "overlap must be in [0, 100), got {}",
            params.overlap_percent
        )));
    }
    if let Some(speed) = params.speed_mps {
        if !(speed > 0.0) {
            return Err(Error::Validation(format!(
                "speed must be positive, got {speed}"
            )));
        }
        if speed > limits.max_speed_mps {
            return Err(Error::Validation(format!(
                "speed {speed} m/s exceeds limit {} m/s",
                limits.max_speed_mps
            )));
        }
    }
    Ok(())
}

/// Spacing between rows: one tenth of the extent, scaled down by overlap.
fn row_spacing(extent: f64, overlap_percent: f64) -> f64 {
    extent * (100.0 - overlap_percent) / 100.0 / 10.0
}

fn push_waypoint(waypoints: &mut Vec<Waypoint>, lat: f64, lon: f64, params: &PatternParams) {
    let order = waypoints.len() as u32 + 1;
    waypoints.push(Waypoint {
        lat,
        lon,
        altitude_m: params.altitude_m,
        order,
        action: WaypointAction::Waypoint,
        speed_mps: params.speed_mps,
    });
}

fn generate_grid(
    boundary: &[[f64; 2]],
    params: &PatternParams,
    limits: &PlanningLimits,
) -> Vec<Waypoint> {
    // Boundary length is validated, so the bounding box exists.
    let bbox = match bounding_box(boundary) {
        Some(bbox) => bbox,
        None => return Vec::new(),
    };
    let mut waypoints = Vec::new();
    sweep_rows(&mut waypoints, &bbox, SweepAxis::Latitude, params, limits);
    waypoints
}

fn generate_crosshatch(
    boundary: &[[f64; 2]],
    params: &PatternParams,
    limits: &PlanningLimits,
) -> Vec<Waypoint> {
    let bbox = match bounding_box(boundary) {
        Some(bbox) => bbox,
        None => return Vec::new(),
    };
    let mut waypoints = Vec::new();
    sweep_rows(&mut waypoints, &bbox, SweepAxis::Latitude, params, limits);
    // Second pass at 90 degrees: same sweep with the stepped axis swapped,
    // appended after the first so the order numbering stays dense.
    sweep_rows(&mut waypoints, &bbox, SweepAxis::Longitude, params, limits);
    waypoints
}

/// Boustrophedon sweep over a bounding box. Even rows run in the low-to-high
/// direction, odd rows are reversed to minimize turn count.
fn sweep_rows(
    waypoints: &mut Vec<Waypoint>,
    bbox: &BoundingBox,
    axis: SweepAxis,
    params: &PatternParams,
    limits: &PlanningLimits,
) {
    let (row_min, row_max, col_min, col_max) = match axis {
        SweepAxis::Latitude => (bbox.min_lat, bbox.max_lat, bbox.min_lon, bbox.max_lon),
        SweepAxis::Longitude => (bbox.min_lon, bbox.max_lon, bbox.min_lat, bbox.max_lat),
    };
    let row_step = row_spacing(row_max - row_min, params.overlap_percent);
    let col_step = row_spacing(col_max - col_min, params.overlap_percent);

    let mut row_index = 0usize;
    let mut row = row_min;
    'rows: loop {
        let mut line = Vec::new();
        let mut col = col_min;
        loop {
            line.push(col);
            // Zero spacing means a degenerate extent; emit one point per row.
            if col_step <= 0.0 {
                break;
            }
            col += col_step;
            if col > col_max {
                break;
            }
        }
        if row_index % 2 == 1 {
            line.reverse();
        }
        for col in line {
            if waypoints.len() >= limits.max_waypoints {
                break 'rows;
            }
            match axis {
                SweepAxis::Latitude => push_waypoint(waypoints, row, col, params),
                SweepAxis::Longitude => push_waypoint(waypoints, col, row, params),
            }
        }
        if row_step <= 0.0 {
            break;
        }
        row += row_step;
        if row > row_max {
            break;
        }
        row_index += 1;
    }
}

fn generate_perimeter(
    boundary: &[[f64; 2]],
    params: &PatternParams,
    limits: &PlanningLimits,
) -> Vec<Waypoint> {
    let mut waypoints = Vec::new();
    for vertex in boundary.iter().take(limits.max_waypoints) {
        push_waypoint(&mut waypoints, vertex[0], vertex[1], params);
    }
    waypoints
}

/// Outward Archimedean spiral from the bounding-box midpoint. The radius
/// grows by one spacing per full turn, so it is non-decreasing across the
/// sequence by construction.
fn generate_spiral(
    boundary: &[[f64; 2]],
    params: &PatternParams,
    limits: &PlanningLimits,
) -> Vec<Waypoint> {
    let bbox = match bounding_box(boundary) {
        Some(bbox) => bbox,
        None => return Vec::new(),
    };
    let (center_lat, center_lon) = bbox.center();
    let max_radius = boundary
        .iter()
        .map(|p| ((p[0] - center_lat).powi(2) + (p[1] - center_lon).powi(2)).sqrt())
        .fold(0.0, f64::max);
    let spacing = row_spacing(max_radius, params.overlap_percent);

    let mut waypoints = Vec::new();
    if spacing <= 0.0 {
        // Degenerate boundary collapses to its centroid.
        push_waypoint(&mut waypoints, center_lat, center_lon, params);
        return waypoints;
    }

    let mut radius = spacing;
    let mut angle: f64 = 0.0;
    while radius <= max_radius && waypoints.len() < limits.max_waypoints {
        push_waypoint(
            &mut waypoints,
            center_lat + radius * angle.cos(),
            center_lon + radius * angle.sin(),
            params,
        );
        angle += spacing / radius;
        radius += spacing / TAU;
    }
    waypoints
}
