//! Geoping Domain Layer
//!
//! This crate contains the core value types of Geoping: location-anchored
//! reminders that fire once when the user's resolved location falls inside
//! their geofence. It has no external dependencies and defines the
//! fundamental concepts and the trait interfaces that all other layers
//! depend upon.
//!
//! ## Key Concepts
//!
//! - **Coordinate**: a latitude/longitude pair in decimal degrees
//! - **Geofence**: a circular region (anchor + radius) attached to a reminder
//! - **Episode**: the span during which one resolved location stays active
//! - **Trigger entry**: a reminder currently inside range, with its distance
//! - **Notification**: the message handed to a sink for a new trigger
//!
//! ## Architecture
//!
//! - No external crate dependencies
//! - Pure value types and the distance function only
//! - Evaluation, deduplication and orchestration live in `geoping-engine`
//! - Trait definitions for all external interactions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coordinate;
pub mod distance;
pub mod episode;
pub mod reminder;
pub mod traits;
pub mod trigger;

// Re-exports for convenience
pub use coordinate::Coordinate;
pub use distance::{haversine_distance, EARTH_RADIUS_METERS};
pub use episode::{EpisodeKey, ResolvedPoint};
pub use reminder::{ReminderGeofence, ReminderId};
pub use traits::ResolveError;
pub use trigger::{Notification, TriggerEntry};
