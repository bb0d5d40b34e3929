//! Engine configuration from environment.

use std::env;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Seconds a returning drone waits before release back to available.
    pub release_grace_secs: u64,
    /// Cruise speed assumed when a mission request omits one.
    pub default_speed_mps: f64,
    /// Broadcast channel capacity for engine events.
    pub event_capacity: usize,
    /// Base delay for release retries when the lifecycle lock is busy.
    pub release_retry_base_ms: u64,
    /// Ceiling for release retry delays.
    pub release_retry_max_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            release_grace_secs: 5,
            default_speed_mps: 5.0,
            event_capacity: 256,
            release_retry_base_ms: 100,
            release_retry_max_ms: 5_000,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            release_grace_secs: env::var("SURVEY_RELEASE_GRACE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.release_grace_secs),
            default_speed_mps: env::var("SURVEY_DEFAULT_SPEED_MPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.default_speed_mps),
            event_capacity: env::var("SURVEY_EVENT_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.event_capacity),
            release_retry_base_ms: env::var("SURVEY_RELEASE_RETRY_BASE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.release_retry_base_ms),
            release_retry_max_ms: env::var("SURVEY_RELEASE_RETRY_MAX_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.release_retry_max_ms),
        }
    }
}
