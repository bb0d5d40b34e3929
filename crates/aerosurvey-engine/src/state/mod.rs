//! Engine state containers.

pub mod store;

pub use store::EngineState;
