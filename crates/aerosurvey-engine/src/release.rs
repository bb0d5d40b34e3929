//! Deferred release of drones back to the available pool.
//!
//! After an abort or completion the drone flies home in `returning` for a
//! grace interval before it can be assigned again. Each pending release is
//! a real task handle keyed by drone id, never a fire-and-forget callback,
//! so it can be cancelled when the drone is reassigned early.

use std::sync::{Arc, TryLockError};
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use aerosurvey_core::DroneStatus;

use crate::backoff::Backoff;
use crate::config::EngineConfig;
use crate::events::{EngineEvent, EventBus};
use crate::state::EngineState;

/// Lock-contention retries before a release is abandoned to the operator.
const MAX_RELEASE_ATTEMPTS: u32 = 6;

#[derive(Debug, Clone)]
pub struct ReleaseScheduler {
    state: Arc<EngineState>,
    events: EventBus,
    grace: Duration,
    retry_base: Duration,
    retry_max: Duration,
    /// At most one pending release per drone. Finished handles linger until
    /// the next schedule for that drone; aborting a finished task is a no-op.
    pending: Arc<DashMap<String, JoinHandle<()>>>,
}

impl ReleaseScheduler {
    pub fn new(state: Arc<EngineState>, events: EventBus, config: &EngineConfig) -> Self {
        Self {
            state,
            events,
            grace: Duration::from_secs(config.release_grace_secs),
            retry_base: Duration::from_millis(config.release_retry_base_ms),
            retry_max: Duration::from_millis(config.release_retry_max_ms),
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Schedule the drone's return to available after the grace interval,
    /// replacing any release already pending for it.
    pub fn schedule(&self, drone_id: &str, mission_id: &str) {
        let state = self.state.clone();
        let events = self.events.clone();
        let grace = self.grace;
        let retry_base = self.retry_base;
        let retry_max = self.retry_max;
        let drone_id = drone_id.to_string();
        let mission_id = mission_id.to_string();

        let task_drone_id = drone_id.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            run_release(state, events, task_drone_id, mission_id, retry_base, retry_max).await;
        });

        if let Some(old) = self.pending.insert(drone_id, handle) {
            old.abort();
        }
    }

    /// Cancel any release pending for the drone.
    pub fn cancel(&self, drone_id: &str) {
        if let Some((_, handle)) = self.pending.remove(drone_id) {
            handle.abort();
        }
    }
}

/// Grace period is over: flip the drone back to available, retrying while
/// the lifecycle lock is held by a concurrent transition.
async fn run_release(
    state: Arc<EngineState>,
    events: EventBus,
    drone_id: String,
    mission_id: String,
    retry_base: Duration,
    retry_max: Duration,
) {
    let lock = state.lifecycle_lock(&drone_id);
    let mut backoff = Backoff::new(retry_base, retry_max);

    loop {
        // The guard must go out of scope before the retry sleep so the
        // spawned future stays `Send`; only the delay crosses the await.
        let delay = {
            let guard = match lock.try_lock() {
                Ok(guard) => Some(guard),
                Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
                Err(TryLockError::WouldBlock) => None,
            };

            match guard {
                Some(_guard) => {
                    if release_if_still_returning(&state, &drone_id, &mission_id) {
                        tracing::info!(drone_id = %drone_id, "drone released to available");
                        events.publish(EngineEvent::DroneStatusChanged {
                            drone_id: drone_id.clone(),
                            status: DroneStatus::Available,
                            mission_id: None,
                        });
                    } else {
                        tracing::debug!(
                            drone_id = %drone_id,
                            "release skipped, drone reassigned or gone during grace period"
                        );
                    }
                    return;
                }
                None => {
                    if backoff.attempts() >= MAX_RELEASE_ATTEMPTS {
                        tracing::error!(
                            drone_id = %drone_id,
                            attempts = backoff.attempts(),
                            "could not release drone, lifecycle lock stayed busy; operator intervention required"
                        );
                        return;
                    }
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        drone_id = %drone_id,
                        attempt = backoff.attempts(),
                        delay_ms = delay.as_millis() as u64,
                        "lifecycle lock busy, retrying drone release"
                    );
                    delay
                }
            }
        };
        tokio::time::sleep(delay).await;
    }
}

/// The timer may be stale: between scheduling and expiry the drone can be
/// re-registered and reassigned. Only release when it is still returning
/// from the mission that scheduled this timer.
fn release_if_still_returning(state: &EngineState, drone_id: &str, mission_id: &str) -> bool {
    let Some(mut drone) = state.drones().get_mut(drone_id) else {
        return false;
    };
    if drone.status != DroneStatus::Returning
        || drone.current_mission.as_deref() != Some(mission_id)
    {
        return false;
    }
    drone.status = DroneStatus::Available;
    drone.current_mission = None;
    drone.last_update = Utc::now();
    true
}
