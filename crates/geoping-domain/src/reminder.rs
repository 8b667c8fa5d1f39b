//! Reminder module - location-anchored reminders

use crate::Coordinate;
use std::fmt;

/// Unique identifier for a reminder
///
/// Assigned by the reminder store. Ordering follows the numeric value and is
/// used to break ties when ranking triggered reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderId(u64);

impl ReminderId {
    /// Create a ReminderId from its raw value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the raw value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ReminderId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ReminderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| format!("Invalid reminder id '{}': {}", s, e))
    }
}

/// A reminder with an optional circular geofence
///
/// Owned by the reminder store; evaluation only ever reads snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderGeofence {
    /// Unique identifier
    pub id: ReminderId,

    /// Display title (non-empty)
    pub title: String,

    /// Free-form notes
    pub notes: String,

    /// Human label for where the anchor came from (typically a postcode)
    pub location_label: Option<String>,

    /// Geofence center. `None` until a location has been attached.
    pub anchor: Option<Coordinate>,

    /// Geofence radius in meters. Values `<= 0` make the reminder unevaluable.
    pub radius_meters: i64,

    /// Whether the reminder is switched on
    pub is_active: bool,
}

impl ReminderGeofence {
    /// Create an active reminder with no notes or label
    pub fn new(
        id: ReminderId,
        title: impl Into<String>,
        anchor: Option<Coordinate>,
        radius_meters: i64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            notes: String::new(),
            location_label: None,
            anchor,
            radius_meters,
            is_active: true,
        }
    }

    /// Set the location label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.location_label = Some(label.into());
        self
    }

    /// Set the active flag
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Anchor coordinate if the reminder can take part in evaluation
    ///
    /// Reminders without an anchor or with a non-positive radius are excluded
    /// from evaluation rather than treated as errors.
    pub fn geofence(&self) -> Option<&Coordinate> {
        if self.radius_meters <= 0 {
            return None;
        }
        self.anchor.as_ref()
    }

    /// Label used when composing messages ("N/A" when unset)
    pub fn label_or_default(&self) -> &str {
        self.location_label.as_deref().unwrap_or("N/A")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_id_ordering() {
        assert!(ReminderId::new(2) < ReminderId::new(5));
        assert_eq!(ReminderId::from(7).value(), 7);
    }

    #[test]
    fn test_reminder_id_parse() {
        assert_eq!(" 42 ".parse::<ReminderId>().unwrap(), ReminderId::new(42));
        assert!("-1".parse::<ReminderId>().is_err());
        assert!("abc".parse::<ReminderId>().is_err());
    }

    #[test]
    fn test_geofence_requires_anchor() {
        let r = ReminderGeofence::new(ReminderId::new(1), "Milk", None, 100);
        assert!(r.geofence().is_none());
    }

    #[test]
    fn test_geofence_requires_positive_radius() {
        let anchor = Some(Coordinate::new_unchecked(51.5, -0.12));
        let zero = ReminderGeofence::new(ReminderId::new(1), "Milk", anchor, 0);
        let negative = ReminderGeofence::new(ReminderId::new(2), "Milk", anchor, -10);
        let ok = ReminderGeofence::new(ReminderId::new(3), "Milk", anchor, 1);

        assert!(zero.geofence().is_none());
        assert!(negative.geofence().is_none());
        assert!(ok.geofence().is_some());
    }

    #[test]
    fn test_label_default() {
        let r = ReminderGeofence::new(ReminderId::new(1), "Milk", None, 100);
        assert_eq!(r.label_or_default(), "N/A");
        assert_eq!(r.with_label("SW1A 1AA").label_or_default(), "SW1A 1AA");
    }
}
