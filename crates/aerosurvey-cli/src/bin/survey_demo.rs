//! Survey Mission Demo - full planning and execution pass in one process.
//!
//! 1. PLAN: generate a waypoint pattern over a field boundary and route it
//!    through the launch pad
//! 2. FLY: create and start the mission, stream progress and telemetry
//! 3. HOLD: pause mid-flight, then resume
//! 4. COMPLETE: record post-flight statistics, wait out the release grace
//!    period, and confirm the drone returns to the available pool
//!
//! Usage:
//!   cargo run -p aerosurvey-cli --bin survey_demo
//!   cargo run -p aerosurvey-cli --bin survey_demo -- --pattern spiral

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tokio::time;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aerosurvey_core::{
    generate_pattern, optimize_route, CompletionReport, Drone, MissionRequest, PatternParams,
    PatternType, ProgressUpdate, Survey, TelemetryUpdate,
};
use aerosurvey_engine::config::EngineConfig;
use aerosurvey_engine::lifecycle::MissionManager;
use aerosurvey_engine::telemetry::TelemetryAggregator;

/// Central Valley field block (survey site)
const FIELD_LAT: f64 = 36.77;
const FIELD_LON: f64 = -119.42;

/// Field extent in degrees (~1.1 km per side)
const FIELD_SPAN_DEG: f64 = 0.01;

/// Flight parameters
const SURVEY_ALTITUDE_M: f64 = 60.0;
const CRUISE_SPEED_MPS: f64 = 8.0;
const OVERLAP_PERCENT: f64 = 30.0;

/// Survey Mission Demo
#[derive(Parser, Debug)]
#[command(author, version, about = "Plan and fly a survey mission end to end")]
struct Args {
    /// Waypoint pattern to fly (grid, crosshatch, perimeter, spiral)
    #[arg(long, default_value = "grid")]
    pattern: String,

    /// Seconds a returning drone waits before release
    #[arg(long, default_value_t = 2)]
    grace_secs: u64,

    /// Progress updates to stream during the flight
    #[arg(long, default_value_t = 8)]
    updates: u32,
}

fn parse_pattern(name: &str) -> Result<PatternType> {
    Ok(match name {
        "grid" => PatternType::Grid,
        "crosshatch" => PatternType::Crosshatch,
        "perimeter" => PatternType::Perimeter,
        "spiral" => PatternType::Spiral,
        other => anyhow::bail!("unknown pattern '{other}' (grid, crosshatch, perimeter, spiral)"),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("aerosurvey_engine=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let pattern = parse_pattern(&args.pattern)?;

    println!("╔═══════════════════════════════════════════════════╗");
    println!("║  AEROSURVEY: PLAN → FLY → COMPLETE                ║");
    println!("╚═══════════════════════════════════════════════════╝");
    println!();

    let mut config = EngineConfig::from_env();
    config.release_grace_secs = args.grace_secs;
    let manager = MissionManager::new(config);
    let aggregator = TelemetryAggregator::new(manager.state().clone());

    manager.state().register_drone(Drone::new("surveyor-1"));
    manager
        .state()
        .register_survey(Survey::new("survey-001", "Central Valley field block"));
    println!("[SETUP] ✓ Registered drone surveyor-1 and survey survey-001");

    // Plan: pattern over the field, routed through the launch pad.
    let boundary = vec![
        [FIELD_LAT, FIELD_LON],
        [FIELD_LAT + FIELD_SPAN_DEG, FIELD_LON],
        [FIELD_LAT + FIELD_SPAN_DEG, FIELD_LON + FIELD_SPAN_DEG],
        [FIELD_LAT, FIELD_LON + FIELD_SPAN_DEG],
    ];
    let waypoints = generate_pattern(
        pattern,
        &boundary,
        &PatternParams {
            altitude_m: SURVEY_ALTITUDE_M,
            overlap_percent: OVERLAP_PERCENT,
            rotation_deg: 0.0,
            speed_mps: Some(CRUISE_SPEED_MPS),
        },
    )?;
    println!(
        "[PLAN] {} pattern over {:.0}m field: {} waypoints",
        args.pattern,
        FIELD_SPAN_DEG * 111_000.0,
        waypoints.len()
    );

    let launch_pad = [FIELD_LAT - 0.002, FIELD_LON - 0.002];
    let route = optimize_route(&waypoints, launch_pad, launch_pad)?;
    println!(
        "[PLAN] routed through launch pad: {} points (takeoff + survey + land)",
        route.len()
    );

    // Print every engine event as it happens.
    let mut events = manager.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            if let Ok(json) = serde_json::to_string(&event) {
                println!("[EVENT] {json}");
            }
        }
    });

    // Fly.
    let mission = manager.create_mission(MissionRequest {
        drone_id: "surveyor-1".to_string(),
        survey_id: Some("survey-001".to_string()),
        pattern,
        waypoints: route,
        speed_mps: Some(CRUISE_SPEED_MPS),
    })?;
    let mission_id = mission.mission_id.clone();
    let started = manager.start(&mission_id)?;
    println!(
        "[FLY] mission {} started, estimated {:.1} min at {} m/s",
        mission_id,
        started.estimated_duration_min.unwrap_or(0.0),
        CRUISE_SPEED_MPS
    );

    let last_index = mission.waypoints.len() - 1;
    let total_updates = args.updates.max(2);
    let pause_at = total_updates / 2;
    for step in 1..=total_updates {
        time::sleep(Duration::from_millis(250)).await;

        let index = (last_index * step as usize) / total_updates as usize;
        let position = &mission.waypoints[index];
        let battery = 100.0 - step as f64 * 3.0;

        // Raw telemetry goes through the aggregator.
        aggregator.ingest(
            &mission_id,
            &TelemetryUpdate {
                lat: Some(position.lat),
                lon: Some(position.lon),
                altitude_m: Some(position.altitude_m),
                speed_mps: Some(CRUISE_SPEED_MPS),
                heading_deg: None,
                battery_level: Some(battery),
                timestamp: Utc::now(),
            },
        )?;

        // Progress accompanies it at a lower rate, capped before completion.
        let progress = step as f64 / total_updates as f64 * 90.0;
        let updated = manager.update_progress(
            &mission_id,
            &ProgressUpdate {
                progress,
                current_waypoint_index: Some(index),
                telemetry: None,
            },
        )?;
        println!(
            "[FLY] progress {:5.1}% | waypoint {:3}/{} | ~{:.1} min left | battery {:.0}%",
            updated.progress,
            index + 1,
            last_index + 1,
            updated.estimated_time_remaining_min.unwrap_or(0.0),
            battery
        );

        if step == pause_at {
            println!("[HOLD] pausing mid-flight");
            manager.pause(&mission_id)?;
            time::sleep(Duration::from_millis(500)).await;
            manager.resume(&mission_id)?;
            println!("[HOLD] resumed");
        }
    }

    // Complete and report.
    let completed = manager.complete(
        &mission_id,
        &CompletionReport {
            battery_used: Some(total_updates as f64 * 3.0),
            images: Some(mission.waypoints.len() as u32),
            videos: None,
        },
    )?;
    if let Some(stats) = &completed.statistics {
        println!();
        println!("[STATS] distance flown : {:.2} km", stats.distance_km);
        println!("[STATS] area covered   : {:.3} km²", stats.area_covered_km2);
        println!("[STATS] duration       : {:.2} min", stats.duration_min);
        println!(
            "[STATS] battery used   : {:.0}%",
            stats.battery_used.unwrap_or(0.0)
        );
        println!("[STATS] images         : {}", stats.images.unwrap_or(0));
    }

    // Release grace: the drone flies home before it is assignable again.
    println!();
    println!(
        "[RTH] drone returning to home, release in {}s",
        args.grace_secs
    );
    time::sleep(Duration::from_secs(args.grace_secs) + Duration::from_millis(300)).await;

    let drone = manager
        .state()
        .get_drone("surveyor-1")
        .ok_or_else(|| anyhow::anyhow!("drone record disappeared"))?;
    let survey = manager
        .state()
        .get_survey("survey-001")
        .ok_or_else(|| anyhow::anyhow!("survey record disappeared"))?;
    println!(
        "[DONE] drone {} | battery {:.0}% | {:.2} flight hours",
        drone.status, drone.battery_level, drone.flight_hours
    );
    println!("[DONE] survey completed: {}", survey.completed);

    printer.abort();
    Ok(())
}
