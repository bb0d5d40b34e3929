//! Shared library surface for the survey mission engine and its tests.

pub mod backoff;
pub mod config;
pub mod events;
pub mod lifecycle;
pub mod release;
pub mod state;
pub mod telemetry;
