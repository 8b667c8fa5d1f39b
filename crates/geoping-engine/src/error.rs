//! Error types for engine operations

use thiserror::Error;

/// Errors that can occur while running the geofence engine
///
/// Resolution failures are not errors here: they clear the current location
/// and are reported as [`crate::ResolutionOutcome::Cleared`].
#[derive(Error, Debug)]
pub enum EngineError {
    /// Reminder store error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Notification delivery error
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Worker error (channel closed, task failure)
    #[error("Worker error: {0}")]
    Worker(String),
}
