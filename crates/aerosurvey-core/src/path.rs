//! Route ordering around caller-chosen launch and recovery positions.

use crate::error::{Error, Result};
use crate::models::{Waypoint, WaypointAction};

/// Nearest-waypoint search compares planar distance on raw degree
/// coordinates. Selection only needs a consistent metric over a small
/// extent, so the haversine formula is deliberately not used here.
fn planar_distance(point: [f64; 2], wp: &Waypoint) -> f64 {
    ((point[0] - wp.lat).powi(2) + (point[1] - wp.lon).powi(2)).sqrt()
}

fn nearest_index(waypoints: &[Waypoint], point: [f64; 2]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, wp) in waypoints.iter().enumerate() {
        let dist = planar_distance(point, wp);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

/// Reorder a generated sequence to launch at `start` and recover at `end`.
///
/// The output is: a synthetic takeoff point at `start`, the window of the
/// original sequence running from the waypoint nearest `start` to the one
/// nearest `end` (wrapping past the array end when the start index comes
/// after the end index), and a synthetic land point at `end`. Orders are
/// re-numbered densely from 1.
pub fn optimize_route(
    waypoints: &[Waypoint],
    start: [f64; 2],
    end: [f64; 2],
) -> Result<Vec<Waypoint>> {
    if waypoints.is_empty() {
        return Err(Error::Validation(
            "cannot optimize an empty waypoint sequence".to_string(),
        ));
    }
    if [start, end]
        .iter()
        .any(|p| !p[0].is_finite() || !p[1].is_finite())
    {
        return Err(Error::Computation(
            "start/end contains non-finite coordinates".to_string(),
        ));
    }

    let start_idx = nearest_index(waypoints, start);
    let end_idx = nearest_index(waypoints, end);

    let mut route = Vec::with_capacity(waypoints.len() + 2);
    route.push(Waypoint {
        lat: start[0],
        lon: start[1],
        altitude_m: waypoints[start_idx].altitude_m,
        order: 0,
        action: WaypointAction::Takeoff,
        speed_mps: None,
    });

    if start_idx <= end_idx {
        route.extend_from_slice(&waypoints[start_idx..=end_idx]);
    } else {
        route.extend_from_slice(&waypoints[start_idx..]);
        route.extend_from_slice(&waypoints[..=end_idx]);
    }

    route.push(Waypoint {
        lat: end[0],
        lon: end[1],
        altitude_m: waypoints[end_idx].altitude_m,
        order: 0,
        action: WaypointAction::Land,
        speed_mps: None,
    });

    for (i, wp) in route.iter_mut().enumerate() {
        wp.order = i as u32 + 1;
    }
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_waypoints(n: usize) -> Vec<Waypoint> {
        (0..n)
            .map(|i| Waypoint {
                lat: 36.77 + i as f64 * 0.001,
                lon: -119.42,
                altitude_m: 50.0,
                order: i as u32 + 1,
                action: WaypointAction::Waypoint,
                speed_mps: None,
            })
            .collect()
    }

    #[test]
    fn wraps_takeoff_and_land_around_the_window() {
        let waypoints = line_waypoints(5);
        let start = [36.7715, -119.42]; // nearest waypoint index 1 or 2
        let end = [36.774, -119.42]; // nearest waypoint index 4
        let route = optimize_route(&waypoints, start, end).unwrap();

        assert_eq!(route.first().unwrap().action, WaypointAction::Takeoff);
        assert_eq!(route.last().unwrap().action, WaypointAction::Land);
        assert_eq!(route.first().unwrap().lat, start[0]);
        assert_eq!(route.last().unwrap().lon, end[1]);
        for (i, wp) in route.iter().enumerate() {
            assert_eq!(wp.order, i as u32 + 1);
        }
        // Interior survives in original order.
        let interior: Vec<f64> = route[1..route.len() - 1].iter().map(|w| w.lat).collect();
        let mut sorted = interior.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(interior, sorted);
    }

    #[test]
    fn window_wraps_when_start_is_after_end() {
        let waypoints = line_waypoints(5);
        // Start near the last waypoint, end near the first.
        let route = optimize_route(&waypoints, [36.774, -119.42], [36.77, -119.42]).unwrap();

        // takeoff + (index 4 .. wrap .. index 0) + land = 1 + 2 + 1
        assert_eq!(route.len(), 4);
        assert_eq!(route[1].lat, waypoints[4].lat);
        assert_eq!(route[2].lat, waypoints[0].lat);
        let orders: Vec<u32> = route.iter().map(|w| w.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn single_waypoint_route_is_takeoff_point_land() {
        let waypoints = line_waypoints(1);
        let route = optimize_route(&waypoints, [36.0, -119.0], [37.0, -120.0]).unwrap();
        assert_eq!(route.len(), 3);
        assert_eq!(route[0].action, WaypointAction::Takeoff);
        assert_eq!(route[1].action, WaypointAction::Waypoint);
        assert_eq!(route[2].action, WaypointAction::Land);
        // Synthetic points inherit the altitude of their anchor waypoints.
        assert_eq!(route[0].altitude_m, 50.0);
        assert_eq!(route[2].altitude_m, 50.0);
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = optimize_route(&[], [0.0, 0.0], [1.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn non_finite_anchor_is_a_computation_error() {
        let waypoints = line_waypoints(3);
        let err = optimize_route(&waypoints, [f64::NAN, 0.0], [1.0, 1.0]).unwrap_err();
        assert!(matches!(err, Error::Computation(_)));
    }
}
