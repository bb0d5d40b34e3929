//! Geodesic math for distance and coverage-area estimates.

use crate::models::Waypoint;
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Degrees-to-kilometers scale used by the shoelace area estimate.
/// Exact only at the equator; accepted approximation, do not "fix"
/// without a geodesically correct replacement.
const KM_PER_DEG: f64 = 111.0;

/// Calculate distance between two points in meters using the Haversine formula.
///
/// Standard great-circle distance between two points on a sphere given
/// their latitudes and longitudes in decimal degrees. Symmetric, and
/// zero for identical points.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Axis-aligned extent of a set of points in degree space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

/// Bounding box of `[lat, lon]` points. None for an empty slice.
pub fn bounding_box(points: &[[f64; 2]]) -> Option<BoundingBox> {
    let first = points.first()?;
    let mut bbox = BoundingBox {
        min_lat: first[0],
        max_lat: first[0],
        min_lon: first[1],
        max_lon: first[1],
    };
    for point in &points[1..] {
        bbox.min_lat = bbox.min_lat.min(point[0]);
        bbox.max_lat = bbox.max_lat.max(point[0]);
        bbox.min_lon = bbox.min_lon.min(point[1]);
        bbox.max_lon = bbox.max_lon.max(point[1]);
    }
    Some(bbox)
}

/// Area of a bounding box in km².
///
/// Width is `R·cos(mean_lat)·Δlon`, height is `R·Δlat`, both in radians.
/// Valid only for small, near-equatorial extents; treat as an estimate,
/// not a geodesically exact area.
pub fn rectangular_area_km2(bbox: &BoundingBox) -> f64 {
    let mean_lat_rad = ((bbox.min_lat + bbox.max_lat) / 2.0).to_radians();
    let width_km = EARTH_RADIUS_KM * mean_lat_rad.cos() * (bbox.max_lon - bbox.min_lon).to_radians();
    let height_km = EARTH_RADIUS_KM * (bbox.max_lat - bbox.min_lat).to_radians();
    (width_km * height_km).abs()
}

/// Polygon area in km² via the shoelace formula evaluated in degree space.
///
/// The signed sum is halved and scaled by a fixed degrees²→km² constant,
/// which does not correct for latitude. Returns 0 for fewer than 3
/// vertices or a degenerate polygon.
pub fn shoelace_area_km2(points: &[[f64; 2]]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        sum += points[i][0] * points[j][1] - points[j][0] * points[i][1];
    }
    (sum.abs() / 2.0) * KM_PER_DEG * KM_PER_DEG
}

/// Total path length in meters: sum of Haversine distances between
/// consecutive waypoints. Zero for fewer than two waypoints.
pub fn path_distance_m(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| haversine_distance(pair[0].lat, pair[0].lon, pair[1].lat, pair[1].lon))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WaypointAction;

    fn wp(lat: f64, lon: f64, order: u32) -> Waypoint {
        Waypoint {
            lat,
            lon,
            altitude_m: 50.0,
            order,
            action: WaypointAction::Waypoint,
            speed_mps: None,
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_distance(36.7783, -119.4179, 36.7783, -119.4179);
        assert!(dist < 0.001);
    }

    #[test]
    fn haversine_is_symmetric() {
        let d1 = haversine_distance(36.77, -119.41, 36.79, -119.38);
        let d2 = haversine_distance(36.79, -119.38, 36.77, -119.41);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn haversine_triangle_inequality() {
        let a = (36.77, -119.41);
        let b = (36.80, -119.35);
        let c = (36.74, -119.30);
        let ab = haversine_distance(a.0, a.1, b.0, b.1);
        let bc = haversine_distance(b.0, b.1, c.0, c.1);
        let ac = haversine_distance(a.0, a.1, c.0, c.1);
        assert!(ac <= ab + bc + 1e-6);
    }

    #[test]
    fn bounding_box_spans_all_points() {
        let points = [[36.77, -119.41], [36.80, -119.35], [36.74, -119.44]];
        let bbox = bounding_box(&points).unwrap();
        assert_eq!(bbox.min_lat, 36.74);
        assert_eq!(bbox.max_lat, 36.80);
        assert_eq!(bbox.min_lon, -119.44);
        assert_eq!(bbox.max_lon, -119.35);
        assert!(bounding_box(&[]).is_none());
    }

    #[test]
    fn rectangular_area_at_equator() {
        // 0.01 deg of latitude is ~1.112 km at the equator, so a
        // 0.01 x 0.01 box is ~1.236 km².
        let bbox = BoundingBox {
            min_lat: 0.0,
            max_lat: 0.01,
            min_lon: 0.0,
            max_lon: 0.01,
        };
        let area = rectangular_area_km2(&bbox);
        let side_km = EARTH_RADIUS_KM * 0.01_f64.to_radians();
        assert!((area - side_km * side_km).abs() / area < 0.001);
    }

    #[test]
    fn shoelace_unit_square() {
        // 1 deg² scaled by the fixed 111 km/deg constant.
        let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let area = shoelace_area_km2(&square);
        assert!((area - 111.0 * 111.0).abs() < 1e-6);
    }

    #[test]
    fn shoelace_degenerate_is_zero() {
        assert_eq!(shoelace_area_km2(&[[0.0, 0.0], [1.0, 1.0]]), 0.0);
        // Collinear vertices enclose no area.
        let line = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        assert!(shoelace_area_km2(&line) < 1e-9);
    }

    #[test]
    fn path_distance_matches_pairwise_sum() {
        let waypoints = vec![wp(0.0, 0.0, 1), wp(0.01, 0.0, 2), wp(0.01, 0.01, 3)];
        let expected = haversine_distance(0.0, 0.0, 0.01, 0.0)
            + haversine_distance(0.01, 0.0, 0.01, 0.01);
        assert!((path_distance_m(&waypoints) - expected).abs() < 1e-9);
        assert_eq!(path_distance_m(&[]), 0.0);
        assert_eq!(path_distance_m(&[wp(1.0, 1.0, 1)]), 0.0);
    }
}
