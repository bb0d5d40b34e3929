//! In-memory state store using DashMap.

use aerosurvey_core::{Drone, Mission, Survey};
use dashmap::DashMap;
use std::sync::{Arc, Mutex};

/// Thread-safe store for missions, drones, and surveys, plus the lock
/// registries guarding them.
///
/// Two lock families exist on purpose. The lifecycle lock (one per drone)
/// serializes transitions that mutate a mission and its bound drone as a
/// pair. The progress lock (one per mission) serializes high-frequency
/// progress and telemetry writes without ever contending with lifecycle
/// transitions, so a pause or abort is never stuck behind a telemetry flood.
#[derive(Debug)]
pub struct EngineState {
    missions: DashMap<String, Mission>,
    drones: DashMap<String, Drone>,
    surveys: DashMap<String, Survey>,
    lifecycle_locks: DashMap<String, Arc<Mutex<()>>>,
    progress_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl EngineState {
    pub fn new() -> Self {
        Self {
            missions: DashMap::new(),
            drones: DashMap::new(),
            surveys: DashMap::new(),
            lifecycle_locks: DashMap::new(),
            progress_locks: DashMap::new(),
        }
    }

    /// Register or replace a drone record.
    pub fn register_drone(&self, drone: Drone) {
        self.drones.insert(drone.drone_id.clone(), drone);
    }

    /// Register or replace a survey record.
    pub fn register_survey(&self, survey: Survey) {
        self.surveys.insert(survey.survey_id.clone(), survey);
    }

    pub fn get_mission(&self, mission_id: &str) -> Option<Mission> {
        self.missions.get(mission_id).map(|r| r.value().clone())
    }

    pub fn get_drone(&self, drone_id: &str) -> Option<Drone> {
        self.drones.get(drone_id).map(|r| r.value().clone())
    }

    pub fn get_survey(&self, survey_id: &str) -> Option<Survey> {
        self.surveys.get(survey_id).map(|r| r.value().clone())
    }

    pub fn list_missions(&self) -> Vec<Mission> {
        self.missions.iter().map(|r| r.value().clone()).collect()
    }

    pub fn list_drones(&self) -> Vec<Drone> {
        self.drones.iter().map(|r| r.value().clone()).collect()
    }

    /// All missions referencing the given survey.
    pub fn missions_for_survey(&self, survey_id: &str) -> Vec<Mission> {
        self.missions
            .iter()
            .filter(|r| r.value().survey_id.as_deref() == Some(survey_id))
            .map(|r| r.value().clone())
            .collect()
    }

    /// Lock serializing lifecycle transitions for one drone and whichever
    /// mission is bound to it. Callers must not hold any map reference
    /// while blocking on this.
    pub fn lifecycle_lock(&self, drone_id: &str) -> Arc<Mutex<()>> {
        self.lifecycle_locks
            .entry(drone_id.to_string())
            .or_default()
            .clone()
    }

    /// Lightweight per-mission lock for progress and telemetry writes.
    pub fn progress_lock(&self, mission_id: &str) -> Arc<Mutex<()>> {
        self.progress_locks
            .entry(mission_id.to_string())
            .or_default()
            .clone()
    }

    pub(crate) fn missions(&self) -> &DashMap<String, Mission> {
        &self.missions
    }

    pub(crate) fn drones(&self) -> &DashMap<String, Drone> {
        &self.drones
    }

    pub(crate) fn surveys(&self) -> &DashMap<String, Survey> {
        &self.surveys
    }

    pub(crate) fn drop_progress_lock(&self, mission_id: &str) {
        self.progress_locks.remove(mission_id);
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerosurvey_core::DroneStatus;

    #[test]
    fn register_and_fetch_roundtrip() {
        let state = EngineState::new();
        state.register_drone(Drone::new("drone-1"));
        state.register_survey(Survey::new("survey-1", "Field A"));

        let drone = state.get_drone("drone-1").unwrap();
        assert_eq!(drone.status, DroneStatus::Available);
        assert_eq!(drone.battery_level, 100.0);
        assert!(state.get_survey("survey-1").is_some());
        assert!(state.get_mission("nope").is_none());
    }

    #[test]
    fn lock_handles_are_shared_per_key() {
        let state = EngineState::new();
        let a = state.lifecycle_lock("drone-1");
        let b = state.lifecycle_lock("drone-1");
        let c = state.lifecycle_lock("drone-2");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));

        let p = state.progress_lock("m-1");
        let q = state.progress_lock("m-1");
        assert!(Arc::ptr_eq(&p, &q));
    }
}
