//! Post-flight statistics for completed missions.

use chrono::{DateTime, Utc};

use crate::geo::{bounding_box, path_distance_m, rectangular_area_km2, shoelace_area_km2};
use crate::models::{CompletionReport, MissionStatistics, PatternType, Waypoint};

/// Compute the statistics recorded on a completed mission.
///
/// Distance is summed over the entire planned waypoint list, not only the
/// portion flown. Area estimation depends on the pattern: bounding-box
/// rectangle for grid and crosshatch, shoelace polygon for perimeter, and
/// zero for spiral where no estimator is defined. Degenerate geometry and
/// missing timestamps yield zeros rather than errors.
pub fn compute_statistics(
    pattern: PatternType,
    waypoints: &[Waypoint],
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    report: &CompletionReport,
) -> MissionStatistics {
    let distance_km = path_distance_m(waypoints) / 1000.0;

    let duration_min = match (start_time, end_time) {
        (Some(start), Some(end)) => {
            let minutes = (end - start).num_milliseconds() as f64 / 60_000.0;
            minutes.max(0.0)
        }
        _ => 0.0,
    };

    let area_covered_km2 = match pattern {
        PatternType::Grid | PatternType::Crosshatch => {
            let points: Vec<[f64; 2]> = waypoints.iter().map(|w| [w.lat, w.lon]).collect();
            bounding_box(&points)
                .map(|bbox| rectangular_area_km2(&bbox))
                .unwrap_or(0.0)
        }
        PatternType::Perimeter => {
            let points: Vec<[f64; 2]> = waypoints.iter().map(|w| [w.lat, w.lon]).collect();
            shoelace_area_km2(&points)
        }
        PatternType::Spiral => 0.0,
    };

    MissionStatistics {
        distance_km,
        area_covered_km2,
        duration_min,
        battery_used: report.battery_used,
        images: report.images,
        videos: report.videos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::haversine_distance;
    use crate::models::WaypointAction;
    use chrono::Duration;

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
    fn distance_and_duration_for_a_simple_flight() {
        let waypoints = vec![wp(0.0, 0.0, 1), wp(0.01, 0.0, 2), wp(0.01, 0.01, 3)];
        let start = Utc::now();
        let end = start + Duration::minutes(12) + Duration::seconds(30);

        let stats = compute_statistics(
            PatternType::Grid,
            &waypoints,
            Some(start),
            Some(end),
            &CompletionReport {
                battery_used: Some(34.0),
                images: Some(118),
                videos: None,
            },
        );

        let expected_m = haversine_distance(0.0, 0.0, 0.01, 0.0)
            + haversine_distance(0.01, 0.0, 0.01, 0.01);
        assert!((stats.distance_km - expected_m / 1000.0).abs() < 1e-9);
        assert!((stats.duration_min - 12.5).abs() < 1e-9);
        assert_eq!(stats.battery_used, Some(34.0));
        assert_eq!(stats.images, Some(118));
        assert_eq!(stats.videos, None);
    }

    #[test]
    fn grid_area_uses_the_waypoint_bounding_box() {
        let waypoints = vec![
            wp(0.0, 0.0, 1),
            wp(0.0, 0.01, 2),
            wp(0.01, 0.01, 3),
            wp(0.01, 0.0, 4),
        ];
        let stats =
            compute_statistics(PatternType::Grid, &waypoints, None, None, &Default::default());
        let points: Vec<[f64; 2]> = waypoints.iter().map(|w| [w.lat, w.lon]).collect();
        let expected = rectangular_area_km2(&bounding_box(&points).unwrap());
        assert!((stats.area_covered_km2 - expected).abs() < 1e-12);
        assert!(stats.area_covered_km2 > 0.0);
    }

    #[test]
    fn perimeter_area_uses_the_shoelace_formula() {
        let waypoints = vec![
            wp(0.0, 0.0, 1),
            wp(0.0, 1.0, 2),
            wp(1.0, 1.0, 3),
            wp(1.0, 0.0, 4),
        ];
        let stats = compute_statistics(
            PatternType::Perimeter,
            &waypoints,
            None,
            None,
            &Default::default(),
        );
        // Unit square in degree space under the fixed 111 km/deg conversion.
        assert!((stats.area_covered_km2 - 111.0 * 111.0).abs() < 1e-6);
    }

    #[test]
    fn spiral_area_is_zero() {
        let waypoints = vec![wp(0.0, 0.0, 1), wp(0.001, 0.001, 2)];
        let stats = compute_statistics(
            PatternType::Spiral,
            &waypoints,
            None,
            None,
            &Default::default(),
        );
        assert_eq!(stats.area_covered_km2, 0.0);
    }

    #[test]
    fn degenerate_inputs_yield_zeros_not_errors() {
        let stats =
            compute_statistics(PatternType::Grid, &[], None, None, &Default::default());
        assert_eq!(stats.distance_km, 0.0);
        assert_eq!(stats.area_covered_km2, 0.0);
        assert_eq!(stats.duration_min, 0.0);

        // End before start clamps to zero rather than going negative.
        let start = Utc::now();
        let end = start - Duration::minutes(5);
        let stats = compute_statistics(
            PatternType::Grid,
            &[wp(0.0, 0.0, 1)],
            Some(start),
            Some(end),
            &Default::default(),
        );
        assert_eq!(stats.duration_min, 0.0);
    }
}
