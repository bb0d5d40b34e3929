//! Mission lifecycle state machine coupling missions to drones.
//!
//! Every transition runs under the per-drone lifecycle lock and mutates the
//! mission and its bound drone as one unit, so concurrent transitions can
//! never produce a half-applied pair. Progress updates deliberately bypass
//! that lock; see `EngineState` for the two-lock layout.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use aerosurvey_core::{
    compute_statistics, path_distance_m, CompletionReport, DroneStatus, Error, Mission,
    MissionRequest, MissionStatus, ProgressUpdate, Result,
};

use crate::config::EngineConfig;
use crate::events::{EngineEvent, EventBus};
use crate::release::ReleaseScheduler;
use crate::state::EngineState;
use crate::telemetry::{apply_telemetry, forward_battery};

/// Orchestrator owning mission/drone lifecycle transitions.
pub struct MissionManager {
    state: Arc<EngineState>,
    events: EventBus,
    release: ReleaseScheduler,
    config: EngineConfig,
}

impl MissionManager {
    pub fn new(config: EngineConfig) -> Self {
        let state = Arc::new(EngineState::new());
        let events = EventBus::new(config.event_capacity);
        let release = ReleaseScheduler::new(state.clone(), events.clone(), &config);
        Self {
            state,
            events,
            release,
            config,
        }
    }

    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    /// Plan a new mission and bind it to an available drone.
    pub fn create_mission(&self, request: MissionRequest) -> Result<Mission> {
        if request.waypoints.is_empty() {
            return Err(Error::Validation(
                "mission requires at least one waypoint".to_string(),
            ));
        }
        let speed = request.speed_mps.unwrap_or(self.config.default_speed_mps);
        if !(speed > 0.0) {
            return Err(Error::Validation(format!(
                "speed must be positive, got {speed}"
            )));
        }

        let now = Utc::now();
        let mission_id = Uuid::new_v4().to_string();

        let mission = {
            let lock = self.state.lifecycle_lock(&request.drone_id);
            let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

            if let Some(survey_id) = &request.survey_id {
                if self.state.get_survey(survey_id).is_none() {
                    return Err(Error::not_found("survey", survey_id));
                }
            }

            let mut drone = self
                .state
                .drones()
                .get_mut(&request.drone_id)
                .ok_or_else(|| Error::not_found("drone", &request.drone_id))?;
            if drone.status != DroneStatus::Available {
                return Err(Error::ResourceConflict(format!(
                    "drone '{}' is {}",
                    drone.drone_id, drone.status
                )));
            }
            // A stale release timer may still be pending if the drone was
            // force-reset to available; it must not fire after reassignment.
            self.release.cancel(&request.drone_id);

            drone.status = DroneStatus::Assigned;
            drone.current_mission = Some(mission_id.clone());
            drone.last_update = now;

            let mission = Mission {
                mission_id: mission_id.clone(),
                survey_id: request.survey_id.clone(),
                drone_id: request.drone_id.clone(),
                pattern: request.pattern,
                status: MissionStatus::Planned,
                waypoints: request.waypoints,
                speed_mps: speed,
                progress: 0.0,
                current_waypoint_index: 0,
                estimated_duration_min: None,
                estimated_time_remaining_min: None,
                start_time: None,
                pause_time: None,
                end_time: None,
                statistics: None,
                abort_reason: None,
                telemetry: None,
                created_at: now,
            };
            self.state
                .missions()
                .insert(mission_id.clone(), mission.clone());
            mission
        };

        tracing::info!(
            mission_id = %mission.mission_id,
            drone_id = %mission.drone_id,
            pattern = ?mission.pattern,
            waypoints = mission.waypoints.len(),
            "mission created"
        );
        self.events.publish(EngineEvent::MissionCreated {
            mission_id: mission.mission_id.clone(),
            drone_id: mission.drone_id.clone(),
            survey_id: mission.survey_id.clone(),
            status: mission.status,
        });
        self.events.publish(EngineEvent::DroneStatusChanged {
            drone_id: mission.drone_id.clone(),
            status: DroneStatus::Assigned,
            mission_id: Some(mission.mission_id.clone()),
        });
        Ok(mission)
    }

    /// Begin executing a planned mission.
    pub fn start(&self, mission_id: &str) -> Result<Mission> {
        let drone_id = self.drone_for(mission_id)?;
        let mission = {
            let lock = self.state.lifecycle_lock(&drone_id);
            let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

            let mut mission = self
                .state
                .missions()
                .get_mut(mission_id)
                .ok_or_else(|| Error::not_found("mission", mission_id))?;
            if mission.status != MissionStatus::Planned {
                return Err(Error::InvalidTransition {
                    from: mission.status,
                    action: "start",
                });
            }
            let mut drone = self
                .state
                .drones()
                .get_mut(&drone_id)
                .ok_or_else(|| Error::not_found("drone", &drone_id))?;

            let now = Utc::now();
            let duration_min = path_distance_m(&mission.waypoints) / mission.speed_mps / 60.0;
            mission.status = MissionStatus::InProgress;
            mission.start_time = Some(now);
            mission.progress = 0.0;
            mission.current_waypoint_index = 0;
            mission.estimated_duration_min = Some(duration_min);
            mission.estimated_time_remaining_min = Some(duration_min);
            drone.status = DroneStatus::Flying;
            drone.last_update = now;
            mission.clone()
        };

        tracing::info!(mission_id = %mission_id, drone_id = %drone_id, "mission started");
        self.events.publish(EngineEvent::MissionStarted {
            mission_id: mission_id.to_string(),
            drone_id: drone_id.clone(),
            estimated_duration_min: mission.estimated_duration_min,
        });
        self.events.publish(EngineEvent::DroneStatusChanged {
            drone_id,
            status: DroneStatus::Flying,
            mission_id: Some(mission_id.to_string()),
        });
        Ok(mission)
    }

    /// Halt an in-progress mission; the drone holds position.
    pub fn pause(&self, mission_id: &str) -> Result<Mission> {
        let drone_id = self.drone_for(mission_id)?;
        let mission = {
            let lock = self.state.lifecycle_lock(&drone_id);
            let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

            let mut mission = self
                .state
                .missions()
                .get_mut(mission_id)
                .ok_or_else(|| Error::not_found("mission", mission_id))?;
            if mission.status != MissionStatus::InProgress {
                return Err(Error::InvalidTransition {
                    from: mission.status,
                    action: "pause",
                });
            }
            let mut drone = self
                .state
                .drones()
                .get_mut(&drone_id)
                .ok_or_else(|| Error::not_found("drone", &drone_id))?;

            let now = Utc::now();
            mission.status = MissionStatus::Paused;
            mission.pause_time = Some(now);
            drone.status = DroneStatus::Hovering;
            drone.last_update = now;
            mission.clone()
        };

        tracing::info!(mission_id = %mission_id, drone_id = %drone_id, "mission paused");
        self.events.publish(EngineEvent::MissionPaused {
            mission_id: mission_id.to_string(),
            drone_id: drone_id.clone(),
        });
        self.events.publish(EngineEvent::DroneStatusChanged {
            drone_id,
            status: DroneStatus::Hovering,
            mission_id: Some(mission_id.to_string()),
        });
        Ok(mission)
    }

    /// Resume a paused mission.
    pub fn resume(&self, mission_id: &str) -> Result<Mission> {
        let drone_id = self.drone_for(mission_id)?;
        let mission = {
            let lock = self.state.lifecycle_lock(&drone_id);
            let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

            let mut mission = self
                .state
                .missions()
                .get_mut(mission_id)
                .ok_or_else(|| Error::not_found("mission", mission_id))?;
            if mission.status != MissionStatus::Paused {
                return Err(Error::InvalidTransition {
                    from: mission.status,
                    action: "resume",
                });
            }
            let mut drone = self
                .state
                .drones()
                .get_mut(&drone_id)
                .ok_or_else(|| Error::not_found("drone", &drone_id))?;

            mission.status = MissionStatus::InProgress;
            mission.pause_time = None;
            drone.status = DroneStatus::Flying;
            drone.last_update = Utc::now();
            mission.clone()
        };

        tracing::info!(mission_id = %mission_id, drone_id = %drone_id, "mission resumed");
        self.events.publish(EngineEvent::MissionResumed {
            mission_id: mission_id.to_string(),
            drone_id: drone_id.clone(),
        });
        self.events.publish(EngineEvent::DroneStatusChanged {
            drone_id,
            status: DroneStatus::Flying,
            mission_id: Some(mission_id.to_string()),
        });
        Ok(mission)
    }

    /// Terminate an active mission early. The drone turns home and is
    /// released back to available once the grace interval elapses.
    pub fn abort(&self, mission_id: &str, reason: &str) -> Result<Mission> {
        let drone_id = self.drone_for(mission_id)?;
        let mission = {
            let lock = self.state.lifecycle_lock(&drone_id);
            let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

            let mut mission = self
                .state
                .missions()
                .get_mut(mission_id)
                .ok_or_else(|| Error::not_found("mission", mission_id))?;
            if !mission.status.is_active() {
                return Err(Error::InvalidTransition {
                    from: mission.status,
                    action: "abort",
                });
            }
            let mut drone = self
                .state
                .drones()
                .get_mut(&drone_id)
                .ok_or_else(|| Error::not_found("drone", &drone_id))?;

            let now = Utc::now();
            mission.status = MissionStatus::Aborted;
            mission.end_time = Some(now);
            mission.abort_reason = Some(reason.to_string());
            mission.pause_time = None;
            drone.status = DroneStatus::Returning;
            drone.last_update = now;
            mission.clone()
        };

        self.release.schedule(&drone_id, mission_id);
        tracing::info!(mission_id = %mission_id, drone_id = %drone_id, reason = %reason, "mission aborted");
        self.events.publish(EngineEvent::MissionAborted {
            mission_id: mission_id.to_string(),
            drone_id: drone_id.clone(),
            reason: reason.to_string(),
        });
        self.events.publish(EngineEvent::DroneStatusChanged {
            drone_id,
            status: DroneStatus::Returning,
            mission_id: Some(mission_id.to_string()),
        });
        Ok(mission)
    }

    /// Complete an active mission, recording post-flight statistics.
    pub fn complete(&self, mission_id: &str, report: &CompletionReport) -> Result<Mission> {
        let drone_id = self.drone_for(mission_id)?;
        let (mission, stats) = {
            let lock = self.state.lifecycle_lock(&drone_id);
            let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

            let mut mission = self
                .state
                .missions()
                .get_mut(mission_id)
                .ok_or_else(|| Error::not_found("mission", mission_id))?;
            if !mission.status.is_active() {
                return Err(Error::InvalidTransition {
                    from: mission.status,
                    action: "complete",
                });
            }
            let mut drone = self
                .state
                .drones()
                .get_mut(&drone_id)
                .ok_or_else(|| Error::not_found("drone", &drone_id))?;

            let now = Utc::now();
            let stats = compute_statistics(
                mission.pattern,
                &mission.waypoints,
                mission.start_time,
                Some(now),
                report,
            );
            mission.status = MissionStatus::Completed;
            mission.progress = 100.0;
            mission.current_waypoint_index = mission.waypoints.len().saturating_sub(1);
            mission.end_time = Some(now);
            mission.pause_time = None;
            mission.estimated_time_remaining_min = Some(0.0);
            mission.statistics = Some(stats.clone());
            drone.status = DroneStatus::Returning;
            drone.flight_hours += stats.duration_min / 60.0;
            drone.last_update = now;
            (mission.clone(), stats)
        };

        self.release.schedule(&drone_id, mission_id);
        if let Some(survey_id) = mission.survey_id.as_deref() {
            self.finish_survey_if_done(survey_id);
        }

        tracing::info!(
            mission_id = %mission_id,
            drone_id = %drone_id,
            distance_km = stats.distance_km,
            duration_min = stats.duration_min,
            "mission completed"
        );
        self.events.publish(EngineEvent::MissionCompleted {
            mission_id: mission_id.to_string(),
            drone_id: drone_id.clone(),
            statistics: stats,
        });
        self.events.publish(EngineEvent::DroneStatusChanged {
            drone_id,
            status: DroneStatus::Returning,
            mission_id: Some(mission_id.to_string()),
        });
        Ok(mission)
    }

    /// Remove a mission that is not active. Deleting a planned mission
    /// frees its drone immediately.
    pub fn delete(&self, mission_id: &str) -> Result<()> {
        let drone_id = self.drone_for(mission_id)?;
        let freed = {
            let lock = self.state.lifecycle_lock(&drone_id);
            let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

            let status = self
                .state
                .get_mission(mission_id)
                .ok_or_else(|| Error::not_found("mission", mission_id))?
                .status;
            match status {
                MissionStatus::Planned => {
                    let freed = match self.state.drones().get_mut(&drone_id) {
                        Some(mut drone) => {
                            drone.status = DroneStatus::Available;
                            drone.current_mission = None;
                            drone.last_update = Utc::now();
                            true
                        }
                        None => false,
                    };
                    self.state.missions().remove(mission_id);
                    freed
                }
                MissionStatus::Completed | MissionStatus::Aborted => {
                    self.state.missions().remove(mission_id);
                    false
                }
                other => {
                    return Err(Error::InvalidTransition {
                        from: other,
                        action: "delete",
                    })
                }
            }
        };
        self.state.drop_progress_lock(mission_id);

        tracing::info!(mission_id = %mission_id, "mission deleted");
        if freed {
            self.events.publish(EngineEvent::DroneStatusChanged {
                drone_id,
                status: DroneStatus::Available,
                mission_id: None,
            });
        }
        Ok(())
    }

    /// Record execution progress and optional inline telemetry for an
    /// in-progress mission. Runs under the progress lock only.
    pub fn update_progress(&self, mission_id: &str, update: &ProgressUpdate) -> Result<Mission> {
        if !update.progress.is_finite() || !(0.0..=100.0).contains(&update.progress) {
            return Err(Error::Validation(format!(
                "progress must be within [0, 100], got {}",
                update.progress
            )));
        }

        let lock = self.state.progress_lock(mission_id);
        let _guard = lock.lock().unwrap_or_else(|p| p.into_inner());

        let (mission, accepted_battery) = {
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
            if let Some(index) = update.current_waypoint_index {
                if index >= mission.waypoints.len() {
                    return Err(Error::Validation(format!(
                        "waypoint index {index} out of range for {} waypoints",
                        mission.waypoints.len()
                    )));
                }
                mission.current_waypoint_index = index;
            }
            mission.progress = update.progress;
            if let Some(duration) = mission.estimated_duration_min {
                mission.estimated_time_remaining_min =
                    Some(duration * (100.0 - update.progress) / 100.0);
            }
            let mut accepted_battery = None;
            if let Some(telemetry) = &update.telemetry {
                if apply_telemetry(&mut mission, telemetry) {
                    accepted_battery = telemetry.battery_level;
                }
            }
            (mission.clone(), accepted_battery)
        };

        if let Some(battery) = accepted_battery {
            forward_battery(&self.state, &mission.drone_id, battery);
        }
        self.events.publish(EngineEvent::MissionProgressUpdated {
            mission_id: mission_id.to_string(),
            progress: mission.progress,
            current_waypoint_index: mission.current_waypoint_index,
        });
        Ok(mission)
    }

    /// Mark the survey completed once every child mission is terminal.
    /// Safe to call repeatedly; only the first caller emits the event.
    fn finish_survey_if_done(&self, survey_id: &str) {
        let missions = self.state.missions_for_survey(survey_id);
        if missions.is_empty() || !missions.iter().all(|m| m.status.is_terminal()) {
            return;
        }
        let newly_completed = match self.state.surveys().get_mut(survey_id) {
            Some(mut survey) if !survey.completed => {
                survey.completed = true;
                true
            }
            _ => false,
        };
        if newly_completed {
            tracing::info!(survey_id = %survey_id, "survey completed");
            self.events.publish(EngineEvent::SurveyCompleted {
                survey_id: survey_id.to_string(),
            });
        }
    }

    fn drone_for(&self, mission_id: &str) -> Result<String> {
        self.state
            .get_mission(mission_id)
            .map(|m| m.drone_id)
            .ok_or_else(|| Error::not_found("mission", mission_id))
    }
}
