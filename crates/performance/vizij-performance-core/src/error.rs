//! Error types for act dispatch and moveset loading.
//!
//! Expected negative outcomes (busy, blocked, unsupported, out of resources) are values,
//! never panics. Nothing here is fatal to the host.

use serde::{Deserialize, Serialize};

use crate::ids::PerformanceId;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActError {
    /// No performer handles this act title
    #[error("Unsupported act: {title}")]
    UnsupportedAct { title: String },

    /// Busy, blocked, or not interruptible
    #[error("State conflict: {reason}")]
    StateConflict { reason: String },

    /// A gating stat is at or below zero
    #[error("Resource insufficient: {stat}")]
    ResourceInsufficient { stat: String },

    /// Operation on a performance that already completed
    #[error("Performance already completed: {id:?}")]
    AlreadyCompleted { id: PerformanceId },

    /// Invalid registration or authored data
    #[error("Configuration error: {reason}")]
    ConfigurationError { reason: String },

    /// Moveset JSON could not be parsed
    #[error("Parse error: {reason}")]
    Parse { reason: String },
}

impl ActError {
    pub fn conflict(reason: impl Into<String>) -> Self {
        ActError::StateConflict {
            reason: reason.into(),
        }
    }

    pub fn unsupported(title: impl Into<String>) -> Self {
        ActError::UnsupportedAct {
            title: title.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        ActError::ConfigurationError {
            reason: reason.into(),
        }
    }
}

/// Result type for performance operations
pub type Result<T> = core::result::Result<T, ActError>;
