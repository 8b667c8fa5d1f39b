//! Geoping Engine
//!
//! Geofence trigger evaluation and at-most-once notification dispatch.
//!
//! # Overview
//!
//! The engine is responsible for:
//! - **Evaluation**: ranking the reminders whose geofence contains the current location
//! - **Deduplication**: notifying each reminder at most once per location episode
//! - **Orchestration**: recomputing whenever the location, the reminder set, the
//!   active-only filter or the notification permission changes
//! - **Metrics collection**: counting dispatches, suppressed duplicates and episodes
//!
//! # Pipeline
//!
//! ```text
//! resolver ──coordinate──▶ evaluate(point, snapshot, active_only)
//!                                   │ ranked TriggerEntry list
//!                                   ▼
//!                          DedupTracker::advance(episode, entries, can_notify)
//!                                   │ new entries only
//!                                   ▼
//!                          Notification ──▶ sink
//! ```
//!
//! ## Episodes
//!
//! | Event | Effect on dedup state |
//! |-------|-----------------------|
//! | Query resolves | New episode, empty notified set |
//! | Query fails to resolve | Episode ends, state discarded |
//! | Explicit clear | Episode ends, state discarded |
//! | Reminder/filter/permission change | Same episode, only new entries dispatched |
//! | Delivery failure | Reminder returns to pending |
//!
//! # Usage
//!
//! ## Synchronous engine
//!
//! ```
//! use geoping_domain::{Coordinate, ReminderGeofence, ReminderId};
//! use geoping_engine::{GeofenceEngine, EngineConfig, ResolutionOutcome};
//!
//! let here = Coordinate::new(51.5, -0.12).unwrap();
//! let mut engine = GeofenceEngine::new(EngineConfig::default());
//! engine.replace_reminders(vec![
//!     ReminderGeofence::new(ReminderId::new(1), "Buy milk", Some(here), 100),
//! ]);
//!
//! match engine.apply_resolution("SW1A 1AA", Ok(here)) {
//!     ResolutionOutcome::Resolved { notifications, .. } => assert_eq!(notifications.len(), 1),
//!     ResolutionOutcome::Cleared { .. } => unreachable!(),
//! }
//! println!("{}", engine.metrics().summary());
//! ```
//!
//! ## Background worker
//!
//! [`EngineWorker`] owns the engine together with a resolver, a reminder store
//! and a sink, and is driven through a cloneable [`EngineHandle`].
//!
//! # Configuration
//!
//! ```toml
//! active_only = true
//! notifications_enabled = true
//! command_buffer = 32
//! ```

#![warn(missing_docs)]

mod config;
mod engine;
mod error;
mod evaluator;
mod metrics;
mod sink;
mod tracker;
mod worker;

pub use config::EngineConfig;
pub use engine::{GeofenceEngine, ResolutionOutcome};
pub use error::EngineError;
pub use evaluator::evaluate;
pub use metrics::EngineMetrics;
pub use sink::{RecordingSink, TracingSink};
pub use tracker::{AdvanceReport, DedupTracker};
pub use worker::{EngineCommand, EngineEvent, EngineHandle, EngineWorker};
