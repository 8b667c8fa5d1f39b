//! Trigger entries and the notifications composed from them

use crate::{EpisodeKey, ReminderGeofence, ReminderId};

/// A reminder whose geofence contains the current location
///
/// Produced fresh by every evaluation and never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerEntry {
    /// Triggered reminder
    pub reminder_id: ReminderId,

    /// Distance from the current location to the reminder anchor (meters, >= 0)
    pub distance_meters: f64,
}

impl TriggerEntry {
    /// Create a trigger entry
    pub fn new(reminder_id: ReminderId, distance_meters: f64) -> Self {
        Self {
            reminder_id,
            distance_meters,
        }
    }
}

/// A message ready to hand to a notification sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Reminder the notification is about
    pub reminder_id: ReminderId,

    /// Notification title
    pub title: String,

    /// Notification body
    pub body: String,

    /// Per-episode delivery hint for sinks that deduplicate on their own
    pub idempotency_key: String,
}

impl Notification {
    /// Compose the notification for a triggered reminder
    ///
    /// # Examples
    ///
    /// ```
    /// use geoping_domain::{Coordinate, EpisodeKey, Notification, ReminderGeofence, ReminderId, TriggerEntry};
    ///
    /// let reminder = ReminderGeofence::new(
    ///     ReminderId::new(3),
    ///     "Buy stamps",
    ///     Some(Coordinate::new_unchecked(51.5, -0.12)),
    ///     250,
    /// )
    /// .with_label("SW1A 1AA");
    /// let entry = TriggerEntry::new(ReminderId::new(3), 79.6);
    ///
    /// let n = Notification::compose(&EpisodeKey::new("ep"), &reminder, &entry);
    /// assert_eq!(n.title, "Reminder triggered: Buy stamps");
    /// assert_eq!(n.body, "Postcode: SW1A 1AA • Distance: 80m • Radius: 250m");
    /// assert_eq!(n.idempotency_key, "ep#3");
    /// ```
    pub fn compose(episode: &EpisodeKey, reminder: &ReminderGeofence, entry: &TriggerEntry) -> Self {
        Self {
            reminder_id: reminder.id,
            title: format!("Reminder triggered: {}", reminder.title),
            body: format!(
                "Postcode: {} • Distance: {}m • Radius: {}m",
                reminder.label_or_default(),
                entry.distance_meters.round() as i64,
                reminder.radius_meters
            ),
            idempotency_key: format!("{}#{}", episode, reminder.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_without_label() {
        let reminder = ReminderGeofence::new(ReminderId::new(9), "Gym", None, 100);
        let entry = TriggerEntry::new(ReminderId::new(9), 0.4);
        let n = Notification::compose(&EpisodeKey::new("q1:N11AA"), &reminder, &entry);

        assert_eq!(n.reminder_id, ReminderId::new(9));
        assert_eq!(n.body, "Postcode: N/A • Distance: 0m • Radius: 100m");
        assert_eq!(n.idempotency_key, "q1:N11AA#9");
    }
}
