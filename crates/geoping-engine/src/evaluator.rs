//! Geofence evaluation: which reminders contain the current location

use geoping_domain::{haversine_distance, Coordinate, ReminderGeofence, TriggerEntry};
use std::cmp::Ordering;

/// Rank the reminders whose geofence contains `point`
///
/// A reminder is triggered when its distance to `point` is at most its
/// radius (the boundary counts as inside). Reminders without an anchor or
/// with a non-positive radius are skipped, as are inactive reminders when
/// `active_only` is set. The result is ordered by ascending distance, then
/// by ascending reminder id. A missing `point` yields no triggers.
///
/// This is a pure function of its inputs.
///
/// # Examples
///
/// ```
/// use geoping_domain::{Coordinate, ReminderGeofence, ReminderId};
/// use geoping_engine::evaluate;
///
/// let here = Coordinate::new(51.5, -0.12).unwrap();
/// let reminders = vec![
///     ReminderGeofence::new(ReminderId::new(1), "Here", Some(here), 10),
///     ReminderGeofence::new(ReminderId::new(2), "Nowhere", None, 10),
/// ];
///
/// let triggered = evaluate(Some(&here), &reminders, true);
/// assert_eq!(triggered.len(), 1);
/// assert_eq!(triggered[0].reminder_id, ReminderId::new(1));
///
/// assert!(evaluate(None, &reminders, true).is_empty());
/// ```
pub fn evaluate(
    point: Option<&Coordinate>,
    reminders: &[ReminderGeofence],
    active_only: bool,
) -> Vec<TriggerEntry> {
    let Some(point) = point else {
        return Vec::new();
    };

    let mut triggered: Vec<TriggerEntry> = reminders
        .iter()
        .filter(|reminder| !active_only || reminder.is_active)
        .filter_map(|reminder| {
            let anchor = reminder.geofence()?;
            let distance = haversine_distance(point, anchor);
            within_radius(distance, reminder.radius_meters)
                .then(|| TriggerEntry::new(reminder.id, distance))
        })
        .collect();

    triggered.sort_by(rank);
    triggered
}

/// Inclusive geofence test: a reminder exactly on its edge is inside
fn within_radius(distance_meters: f64, radius_meters: i64) -> bool {
    distance_meters <= radius_meters as f64
}

/// Ascending distance, ties broken by ascending id
fn rank(a: &TriggerEntry, b: &TriggerEntry) -> Ordering {
    a.distance_meters
        .total_cmp(&b.distance_meters)
        .then_with(|| a.reminder_id.cmp(&b.reminder_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoping_domain::{ReminderId, EARTH_RADIUS_METERS};

    /// Move `meters` due north of `origin`
    fn north_of(origin: Coordinate, meters: f64) -> Coordinate {
        let degrees = (meters / EARTH_RADIUS_METERS).to_degrees();
        Coordinate::new_unchecked(origin.latitude + degrees, origin.longitude)
    }

    fn reminder(id: u64, anchor: Option<Coordinate>, radius: i64) -> ReminderGeofence {
        ReminderGeofence::new(ReminderId::new(id), format!("Reminder {}", id), anchor, radius)
    }

    const P: Coordinate = Coordinate::new_unchecked(51.5, -0.12);

    #[test]
    fn test_inside_outside_and_unanchored() {
        let reminders = vec![
            reminder(1, Some(north_of(P, 80.0)), 100),
            reminder(2, Some(north_of(P, 150.0)), 100),
            reminder(3, None, 100),
        ];

        let triggered = evaluate(Some(&P), &reminders, true);

        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].reminder_id, ReminderId::new(1));
        assert!((triggered[0].distance_meters - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_equal_distance_orders_by_id() {
        let anchor = Some(north_of(P, 50.0));
        let reminders = vec![reminder(5, anchor, 100), reminder(2, anchor, 100)];

        let ids: Vec<_> = evaluate(Some(&P), &reminders, true)
            .into_iter()
            .map(|e| e.reminder_id.value())
            .collect();

        assert_eq!(ids, vec![2, 5]);
    }

    #[test]
    fn test_sorted_by_distance() {
        let reminders = vec![
            reminder(1, Some(north_of(P, 90.0)), 500),
            reminder(2, Some(north_of(P, 10.0)), 500),
            reminder(3, Some(north_of(P, 300.0)), 500),
        ];

        let ids: Vec<_> = evaluate(Some(&P), &reminders, true)
            .into_iter()
            .map(|e| e.reminder_id.value())
            .collect();

        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        assert!(within_radius(100.0, 100));
        assert!(within_radius(99.999, 100));
        assert!(!within_radius(100.000_001, 100));
        assert!(within_radius(0.0, 1));
    }

    #[test]
    fn test_radius_rounding_around_anchor() {
        let anchor = north_of(P, 100.4);
        let exact = haversine_distance(&P, &anchor);

        let inside = reminder(3, Some(anchor), exact.ceil() as i64);
        let outside = reminder(4, Some(anchor), exact.floor() as i64);
        let triggered = evaluate(Some(&P), &[inside, outside], true);

        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].reminder_id, ReminderId::new(3));
    }

    #[test]
    fn test_active_filter() {
        let anchor = Some(P);
        let reminders = vec![
            reminder(1, anchor, 50).with_active(false),
            reminder(2, anchor, 50),
        ];

        let active: Vec<_> = evaluate(Some(&P), &reminders, true)
            .into_iter()
            .map(|e| e.reminder_id.value())
            .collect();
        let all: Vec<_> = evaluate(Some(&P), &reminders, false)
            .into_iter()
            .map(|e| e.reminder_id.value())
            .collect();

        assert_eq!(active, vec![2]);
        assert_eq!(all, vec![1, 2]);
    }

    #[test]
    fn test_invalid_radius_excluded() {
        let reminders = vec![reminder(1, Some(P), 0), reminder(2, Some(P), -5)];
        assert!(evaluate(Some(&P), &reminders, false).is_empty());
    }

    #[test]
    fn test_no_point_is_empty() {
        let reminders = vec![reminder(1, Some(P), 100)];
        assert!(evaluate(None, &reminders, false).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let reminders: Vec<_> = (0..20)
            .map(|i| reminder(i, Some(north_of(P, (i % 4) as f64 * 25.0)), 100))
            .collect();
        assert_eq!(
            evaluate(Some(&P), &reminders, true),
            evaluate(Some(&P), &reminders, true)
        );
    }
}
