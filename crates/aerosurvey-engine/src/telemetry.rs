//! High-frequency telemetry ingestion for in-progress missions.

use std::sync::Arc;

use chrono::Utc;

use aerosurvey_core::{Error, Mission, MissionStatus, Result, TelemetrySnapshot, TelemetryUpdate};

use crate::state::EngineState;

/// Merge an update into the mission's snapshot. Returns false when the
/// payload is older than the stored snapshot and was dropped.
pub(crate) fn apply_telemetry(mission: &mut Mission, update: &TelemetryUpdate) -> bool {
    match mission.telemetry.as_mut() {
        Some(snapshot) => snapshot.merge(update),
        None => {
            mission.telemetry = Some(TelemetrySnapshot::from_update(update));
            true
        }
    }
}

/// Write an accepted battery reading through to the bound drone.
pub(crate) fn forward_battery(state: &EngineState, drone_id: &str, battery: f64) {
    if let Some(mut drone) = state.drones().get_mut(drone_id) {
        drone.battery_level = battery.clamp(0.0, 100.0);
        drone.last_update = Utc::now();
    }
}

/// Ingests raw telemetry payloads without touching lifecycle locks.
///
/// Holds only the per-mission progress lock, so a pause or abort request
/// is never queued behind a burst of telemetry.
pub struct TelemetryAggregator {
    state: Arc<EngineState>,
}

impl TelemetryAggregator {
    pub fn new(state: Arc<EngineState>) -> Self {
        Self { state }
    }

    /// Ingest one telemetry payload for an in-progress mission.
    ///
    /// Payloads older than the stored snapshot are dropped silently;
    /// out-of-order delivery is expected and is not an error.
    pub fn ingest(&self, mission_id: &str, update: &TelemetryUpdate) -> Result<()> {
        let lock = self.state.progress_lock(mission_id);
        let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

        let (accepted, drone_id) = {
            let mut mission = self
                .state
                .missions()
                .get_mut(mission_id)
                .ok_or_else(|| Error::not_found("mission", mission_id))?;
            if mission.status != MissionStatus::InProgress {
                return Err(Error::InvalidTransition {
                    from: mission.status,
                    action: "update",
                });
            }
            let accepted = apply_telemetry(&mut mission, update);
            (accepted, mission.drone_id.clone())
        };

        if accepted {
            if let Some(battery) = update.battery_level {
                forward_battery(&self.state, &drone_id, battery);
            }
        }
        Ok(())
    }
}
