//! Error taxonomy shared across the survey engine.

use crate::models::MissionStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed input, rejected before any mutation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced record does not resolve.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// Attempt to bind a drone that is not available.
    #[error("resource conflict: {0}")]
    ResourceConflict(String),

    /// Lifecycle operation requested from a state that does not allow it.
    #[error("cannot {action} mission while {from}")]
    InvalidTransition {
        from: MissionStatus,
        action: &'static str,
    },

    /// Unrecoverable geometry input (non-finite coordinates).
    #[error("computation failed: {0}")]
    Computation(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
