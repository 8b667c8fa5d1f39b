//! Notification sinks provided by the engine crate

use crate::EngineError;
use geoping_domain::traits::NotificationSink;
use geoping_domain::{Notification, ReminderId};
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Sink that writes every notification to the `tracing` log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    type Error = Infallible;

    async fn dispatch(&self, notification: &Notification) -> Result<(), Self::Error> {
        tracing::info!(
            reminder_id = %notification.reminder_id,
            key = %notification.idempotency_key,
            "{}: {}",
            notification.title,
            notification.body
        );
        Ok(())
    }
}

/// In-memory sink that records deliveries
///
/// Clones share the same record, so a test can keep one handle while the
/// worker owns another. Deliveries for reminders registered with
/// [`fail_for`](Self::fail_for) return an error instead of being recorded.
///
/// # Examples
///
/// ```
/// use geoping_engine::RecordingSink;
///
/// let sink = RecordingSink::new();
/// let observer = sink.clone();
/// assert!(observer.delivered().is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<Notification>>>,
    failing: Arc<Mutex<HashSet<ReminderId>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RecordingSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Make deliveries for `reminder_id` fail until [`recover`](Self::recover) is called
    pub fn fail_for(&self, reminder_id: ReminderId) {
        lock(&self.failing).insert(reminder_id);
    }

    /// Let deliveries for `reminder_id` succeed again
    pub fn recover(&self, reminder_id: ReminderId) {
        lock(&self.failing).remove(&reminder_id);
    }

    /// Everything delivered so far, in delivery order
    pub fn delivered(&self) -> Vec<Notification> {
        lock(&self.delivered).clone()
    }

    /// Number of deliveries for `reminder_id`
    pub fn count_for(&self, reminder_id: ReminderId) -> usize {
        lock(&self.delivered)
            .iter()
            .filter(|n| n.reminder_id == reminder_id)
            .count()
    }
}

impl NotificationSink for RecordingSink {
    type Error = EngineError;

    async fn dispatch(&self, notification: &Notification) -> Result<(), Self::Error> {
        if lock(&self.failing).contains(&notification.reminder_id) {
            return Err(EngineError::Delivery(format!(
                "delivery refused for reminder {}",
                notification.reminder_id
            )));
        }
        lock(&self.delivered).push(notification.clone());
        Ok(())
    }
}
