//! Telemetry ingestion integration tests.

use chrono::{DateTime, Duration, Utc};

use aerosurvey_core::{
    Drone, Error, MissionRequest, MissionStatus, PatternType, ProgressUpdate, TelemetryUpdate,
    Waypoint, WaypointAction,
};
use aerosurvey_engine::config::EngineConfig;
use aerosurvey_engine::lifecycle::MissionManager;
use aerosurvey_engine::telemetry::TelemetryAggregator;

fn make_waypoints() -> Vec<Waypoint> {
    (0..3)
        .map(|i| Waypoint {
            lat: 36.77 + i as f64 * 0.001,
            lon: -119.42,
            altitude_m: 40.0,
            order: i + 1,
            action: WaypointAction::Waypoint,
            speed_mps: None,
        })
        .collect()
}

fn payload(timestamp: DateTime<Utc>) -> TelemetryUpdate {
    TelemetryUpdate {
        lat: None,
        lon: None,
        altitude_m: None,
        speed_mps: None,
        heading_deg: None,
        battery_level: None,
        timestamp,
    }
}

/// Engine with one drone flying one in-progress mission.
fn flying_mission() -> (MissionManager, TelemetryAggregator, String) {
    let manager = MissionManager::new(EngineConfig::default());
    manager.state().register_drone(Drone::new("drone-1"));
    let mission = manager
        .create_mission(MissionRequest {
            drone_id: "drone-1".to_string(),
            survey_id: None,
            pattern: PatternType::Grid,
            waypoints: make_waypoints(),
            speed_mps: Some(5.0),
        })
        .unwrap();
    manager.start(&mission.mission_id).unwrap();
    let aggregator = TelemetryAggregator::new(manager.state().clone());
    (manager, aggregator, mission.mission_id)
}

#[tokio::test]
async fn test_ingest_merges_partial_payloads() {
    let (manager, aggregator, mission_id) = flying_mission();
    let t0 = Utc::now();

    let mut first = payload(t0);
    first.lat = Some(36.771);
    first.lon = Some(-119.419);
    first.battery_level = Some(91.0);
    let before = Utc::now();
    aggregator.ingest(&mission_id, &first).unwrap();

    let snapshot = manager
        .state()
        .get_mission(&mission_id)
        .unwrap()
        .telemetry
        .unwrap();
    assert_eq!(snapshot.lat, Some(36.771));
    assert_eq!(snapshot.battery_level, Some(91.0));
    assert_eq!(snapshot.timestamp, t0);
    assert!(snapshot.received_at >= before);

    // Battery reading flows through to the drone.
    let drone = manager.state().get_drone("drone-1").unwrap();
    assert_eq!(drone.battery_level, 91.0);

    // A later payload carrying only altitude keeps earlier fields.
    let mut second = payload(t0 + Duration::seconds(1));
    second.altitude_m = Some(41.5);
    aggregator.ingest(&mission_id, &second).unwrap();

    let snapshot = manager
        .state()
        .get_mission(&mission_id)
        .unwrap()
        .telemetry
        .unwrap();
    assert_eq!(snapshot.altitude_m, Some(41.5));
    assert_eq!(snapshot.lat, Some(36.771));
    assert_eq!(snapshot.timestamp, t0 + Duration::seconds(1));
}

#[tokio::test]
async fn test_out_of_order_payload_is_dropped_silently() {
    let (manager, aggregator, mission_id) = flying_mission();
    let now = Utc::now();

    let mut current = payload(now);
    current.lat = Some(36.775);
    current.battery_level = Some(80.0);
    aggregator.ingest(&mission_id, &current).unwrap();

    // An older payload arrives late: accepted call, ignored content.
    let mut stale = payload(now - Duration::seconds(10));
    stale.lat = Some(10.0);
    stale.battery_level = Some(5.0);
    aggregator.ingest(&mission_id, &stale).unwrap();

    let snapshot = manager
        .state()
        .get_mission(&mission_id)
        .unwrap()
        .telemetry
        .unwrap();
    assert_eq!(snapshot.lat, Some(36.775));
    assert_eq!(snapshot.timestamp, now);

    // The stale battery reading was not forwarded either.
    let drone = manager.state().get_drone("drone-1").unwrap();
    assert_eq!(drone.battery_level, 80.0);
}

#[tokio::test]
async fn test_battery_is_clamped_on_the_drone() {
    let (manager, aggregator, mission_id) = flying_mission();
    let now = Utc::now();

    let mut over = payload(now);
    over.battery_level = Some(150.0);
    aggregator.ingest(&mission_id, &over).unwrap();
    assert_eq!(
        manager.state().get_drone("drone-1").unwrap().battery_level,
        100.0
    );

    let mut under = payload(now + Duration::seconds(1));
    under.battery_level = Some(-20.0);
    aggregator.ingest(&mission_id, &under).unwrap();
    assert_eq!(
        manager.state().get_drone("drone-1").unwrap().battery_level,
        0.0
    );
}

#[tokio::test]
async fn test_ingest_requires_an_in_progress_mission() {
    let manager = MissionManager::new(EngineConfig::default());
    manager.state().register_drone(Drone::new("drone-1"));
    let aggregator = TelemetryAggregator::new(manager.state().clone());

    assert!(matches!(
        aggregator.ingest("ghost", &payload(Utc::now())),
        Err(Error::NotFound {
            kind: "mission",
            ..
        })
    ));

    let mission = manager
        .create_mission(MissionRequest {
            drone_id: "drone-1".to_string(),
            survey_id: None,
            pattern: PatternType::Grid,
            waypoints: make_waypoints(),
            speed_mps: None,
        })
        .unwrap();

    // Planned missions take no telemetry.
    assert!(matches!(
        aggregator.ingest(&mission.mission_id, &payload(Utc::now())),
        Err(Error::InvalidTransition {
            from: MissionStatus::Planned,
            ..
        })
    ));

    manager.start(&mission.mission_id).unwrap();
    manager.pause(&mission.mission_id).unwrap();
    assert!(matches!(
        aggregator.ingest(&mission.mission_id, &payload(Utc::now())),
        Err(Error::InvalidTransition {
            from: MissionStatus::Paused,
            ..
        })
    ));
}

#[tokio::test]
async fn test_inline_progress_telemetry_uses_the_same_merge_rules() {
    let (manager, aggregator, mission_id) = flying_mission();
    let now = Utc::now();

    let mut current = payload(now);
    current.lat = Some(36.775);
    aggregator.ingest(&mission_id, &current).unwrap();

    // A progress update carrying stale telemetry still applies its
    // progress; only the telemetry portion is skipped.
    let mut stale = payload(now - Duration::seconds(3));
    stale.lat = Some(0.0);
    let updated = manager
        .update_progress(
            &mission_id,
            &ProgressUpdate {
                progress: 40.0,
                current_waypoint_index: Some(1),
                telemetry: Some(stale),
            },
        )
        .unwrap();

    assert_eq!(updated.progress, 40.0);
    assert_eq!(updated.current_waypoint_index, 1);
    let snapshot = updated.telemetry.unwrap();
    assert_eq!(snapshot.lat, Some(36.775));
    assert_eq!(snapshot.timestamp, now);
}
