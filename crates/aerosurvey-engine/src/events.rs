//! Broadcast bus carrying one event per successful lifecycle transition.

use aerosurvey_core::{DroneStatus, MissionStatistics, MissionStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Engine notification, tagged for direct serialization onto a stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum EngineEvent {
    #[serde(rename = "mission:created")]
    MissionCreated {
        mission_id: String,
        drone_id: String,
        survey_id: Option<String>,
        status: MissionStatus,
    },
    #[serde(rename = "mission:started")]
    MissionStarted {
        mission_id: String,
        drone_id: String,
        estimated_duration_min: Option<f64>,
    },
    #[serde(rename = "mission:paused")]
    MissionPaused { mission_id: String, drone_id: String },
    #[serde(rename = "mission:resumed")]
    MissionResumed { mission_id: String, drone_id: String },
    #[serde(rename = "mission:aborted")]
    MissionAborted {
        mission_id: String,
        drone_id: String,
        reason: String,
    },
    #[serde(rename = "mission:completed")]
    MissionCompleted {
        mission_id: String,
        drone_id: String,
        statistics: MissionStatistics,
    },
    #[serde(rename = "mission:progress_updated")]
    MissionProgressUpdated {
        mission_id: String,
        progress: f64,
        current_waypoint_index: usize,
    },
    #[serde(rename = "drone:status_changed")]
    DroneStatusChanged {
        drone_id: String,
        status: DroneStatus,
        mission_id: Option<String>,
    },
    #[serde(rename = "survey:completed")]
    SurveyCompleted { survey_id: String },
}

/// Cheaply cloneable handle to the engine's event channel.
///
/// Publishing never blocks and never fails; events published with no
/// subscribers are dropped, and slow subscribers observe a lag error on
/// their receiver rather than exerting backpressure on the engine.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_colon_tags() {
        let event = EngineEvent::MissionCreated {
            mission_id: "m-1".to_string(),
            drone_id: "d-1".to_string(),
            survey_id: None,
            status: MissionStatus::Planned,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "mission:created");
        assert_eq!(json["status"], "planned");

        let event = EngineEvent::DroneStatusChanged {
            drone_id: "d-1".to_string(),
            status: DroneStatus::Returning,
            mission_id: Some("m-1".to_string()),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "drone:status_changed");
        assert_eq!(json["status"], "returning");
    }

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(EngineEvent::SurveyCompleted {
            survey_id: "s-1".to_string(),
        });
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, EngineEvent::SurveyCompleted { survey_id } if survey_id == "s-1"));
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new(8);
        bus.publish(EngineEvent::MissionPaused {
            mission_id: "m-1".to_string(),
            drone_id: "d-1".to_string(),
        });
    }
}
