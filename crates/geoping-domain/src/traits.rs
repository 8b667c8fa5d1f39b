//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the geofence engine and the
//! collaborators around it. Implementations live in other crates.

use crate::{Coordinate, Notification, ReminderGeofence};
use std::fmt;
use std::future::Future;

/// Why a location query could not be resolved
///
/// The engine treats both variants the same way: the current location is
/// cleared and the running episode ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The query has no known coordinate
    NotFound,

    /// Transient failure (network, upstream outage, malformed response)
    Unavailable(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound => write!(f, "Location not found"),
            ResolveError::Unavailable(reason) => write!(f, "Resolver unavailable: {}", reason),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Trait for turning a location query (e.g. a postcode) into a coordinate
///
/// Implemented by the infrastructure layer (geoping-resolver).
/// Timeouts and retries are the implementation's concern.
pub trait LocationResolver {
    /// Resolve `query` to a coordinate
    fn resolve(&self, query: &str) -> impl Future<Output = Result<Coordinate, ResolveError>> + Send;
}

/// Trait for reading the current set of reminders
///
/// Implemented by the infrastructure layer (geoping-store).
/// The engine never writes through this trait.
pub trait ReminderStore {
    /// Error type for store operations
    type Error;

    /// Point-in-time copy of every reminder
    fn snapshot(&self) -> Result<Vec<ReminderGeofence>, Self::Error>;
}

/// Trait for delivering notifications to the user
///
/// Exactly-once delivery is enforced by the engine, not by the sink; the
/// notification's idempotency key is only a hint.
pub trait NotificationSink {
    /// Error type for delivery failures
    type Error;

    /// Deliver a single notification
    fn dispatch(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
