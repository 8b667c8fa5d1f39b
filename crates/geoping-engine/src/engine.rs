//! Synchronous orchestration of evaluation and deduplication

use crate::{evaluate, DedupTracker, EngineConfig, EngineMetrics};
use geoping_domain::{
    Coordinate, EpisodeKey, Notification, ReminderGeofence, ReminderId, ResolveError,
    ResolvedPoint, TriggerEntry,
};
use std::collections::HashMap;

/// Result of applying a location resolution to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionOutcome {
    /// A new episode started at the resolved point
    Resolved {
        /// The resolved location and its episode
        point: ResolvedPoint,
        /// Notifications to deliver for the new episode
        notifications: Vec<Notification>,
    },

    /// Resolution failed; the location was cleared and no episode is active
    Cleared {
        /// Why the query could not be resolved
        reason: ResolveError,
    },
}

/// Geofence engine: the single writer of all evaluation state
///
/// Holds the current resolved point, the latest reminder snapshot, the
/// active-only filter and the notification permission. Every input change
/// recomputes the triggered list and returns the notifications that are new
/// for the current episode. Recomputing with unchanged inputs never produces
/// a notification twice.
///
/// # Examples
///
/// ```
/// use geoping_domain::{Coordinate, ReminderGeofence, ReminderId, ResolvedPoint};
/// use geoping_engine::GeofenceEngine;
///
/// let here = Coordinate::new(51.5, -0.12).unwrap();
/// let mut engine = GeofenceEngine::default_config();
/// engine.replace_reminders(vec![
///     ReminderGeofence::new(ReminderId::new(1), "Post letter", Some(here), 50),
/// ]);
///
/// let sent = engine.set_resolved_point(ResolvedPoint::at(here));
/// assert_eq!(sent.len(), 1);
/// assert!(engine.recompute().is_empty());
/// ```
#[derive(Debug)]
pub struct GeofenceEngine {
    point: Option<ResolvedPoint>,
    reminders: Vec<ReminderGeofence>,
    active_only: bool,
    can_notify: bool,
    resolutions: u64,
    tracker: DedupTracker,
    metrics: EngineMetrics,
}

impl GeofenceEngine {
    /// Create an engine with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        Self {
            point: None,
            reminders: Vec::new(),
            active_only: config.active_only,
            can_notify: config.notifications_enabled,
            resolutions: 0,
            tracker: DedupTracker::new(),
            metrics: EngineMetrics::new(),
        }
    }

    /// Create an engine with default configuration
    pub fn default_config() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Get a mutable reference to the metrics (for worker-level counters)
    pub fn metrics_mut(&mut self) -> &mut EngineMetrics {
        &mut self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Current resolved point, if any
    pub fn resolved_point(&self) -> Option<&ResolvedPoint> {
        self.point.as_ref()
    }

    /// Latest reminder snapshot
    pub fn reminders(&self) -> &[ReminderGeofence] {
        &self.reminders
    }

    /// Whether inactive reminders are filtered out
    pub fn active_only(&self) -> bool {
        self.active_only
    }

    /// Whether notifications are currently permitted
    pub fn can_notify(&self) -> bool {
        self.can_notify
    }

    /// The deduplication tracker
    pub fn tracker(&self) -> &DedupTracker {
        &self.tracker
    }

    /// Currently triggered reminders, ranked, without touching dedup state
    pub fn triggered(&self) -> Vec<TriggerEntry> {
        evaluate(
            self.point.as_ref().map(|p| &p.coordinate),
            &self.reminders,
            self.active_only,
        )
    }

    /// Make `point` the current location and recompute
    ///
    /// A point whose episode key differs from the current one starts a new
    /// episode.
    pub fn set_resolved_point(&mut self, point: ResolvedPoint) -> Vec<Notification> {
        tracing::info!(
            "Resolved point set to {} (episode {})",
            point.coordinate,
            point.episode
        );
        self.point = Some(point);
        self.recompute()
    }

    /// Clear the current location, ending the episode
    pub fn clear_resolved_point(&mut self) {
        self.point = None;
        if self.tracker.clear() {
            self.metrics.record_episode_end();
            tracing::info!("Resolved point cleared, episode ended");
        }
    }

    /// Apply the result of resolving `query`
    ///
    /// A successful resolution always starts a new episode, even when the
    /// same query was resolved before. A failure clears the location.
    pub fn apply_resolution(
        &mut self,
        query: &str,
        result: Result<Coordinate, ResolveError>,
    ) -> ResolutionOutcome {
        match result {
            Ok(coordinate) => {
                self.resolutions += 1;
                let episode = EpisodeKey::for_query(query, self.resolutions);
                let point = ResolvedPoint::new(coordinate, episode);
                let notifications = self.set_resolved_point(point.clone());
                ResolutionOutcome::Resolved {
                    point,
                    notifications,
                }
            }
            Err(reason) => {
                tracing::warn!("Could not resolve '{}': {}", query, reason);
                self.metrics.record_resolution_failure();
                self.clear_resolved_point();
                ResolutionOutcome::Cleared { reason }
            }
        }
    }

    /// Replace the reminder snapshot and recompute
    pub fn replace_reminders(&mut self, reminders: Vec<ReminderGeofence>) -> Vec<Notification> {
        tracing::debug!("Reminder snapshot replaced ({} reminders)", reminders.len());
        self.reminders = reminders;
        self.recompute()
    }

    /// Toggle the active-only filter and recompute
    pub fn set_active_only(&mut self, active_only: bool) -> Vec<Notification> {
        self.active_only = active_only;
        self.recompute()
    }

    /// Update the notification permission and recompute
    ///
    /// Granting permission dispatches exactly the entries that were withheld.
    pub fn set_permission(&mut self, can_notify: bool) -> Vec<Notification> {
        self.can_notify = can_notify;
        self.recompute()
    }

    /// Evaluate, advance the tracker and compose notifications for new triggers
    pub fn recompute(&mut self) -> Vec<Notification> {
        self.metrics.record_evaluation();

        let Some(point) = &self.point else {
            return Vec::new();
        };

        let entries = evaluate(Some(&point.coordinate), &self.reminders, self.active_only);
        let report = self
            .tracker
            .advance_with_report(&point.episode, &entries, self.can_notify);

        if report.episode_started {
            self.metrics.record_episode_start();
        }
        self.metrics.record_suppressed(report.already_notified);
        self.metrics.record_pending(report.pending);

        let by_id: HashMap<ReminderId, &ReminderGeofence> =
            self.reminders.iter().map(|r| (r.id, r)).collect();

        let notifications: Vec<Notification> = report
            .dispatch
            .iter()
            .filter_map(|entry| {
                let reminder = by_id.get(&entry.reminder_id)?;
                Some(Notification::compose(&point.episode, reminder, entry))
            })
            .collect();

        self.metrics.record_dispatched(notifications.len());
        tracing::debug!(
            "Recomputed: {} triggered, {} new, {} pending permission",
            entries.len(),
            notifications.len(),
            report.pending
        );

        notifications
    }

    /// Undo the dedup reservation for a notification whose delivery failed
    ///
    /// The reminder becomes pending again and is re-emitted by the next
    /// recompute, provided the episode with this `epoch` is still current.
    /// Capture the epoch with [`episode_epoch`](Self::episode_epoch) right
    /// after the call that produced the notification.
    pub fn release_failed(&mut self, epoch: u64, reminder_id: ReminderId) -> bool {
        self.metrics.record_delivery_failure();
        self.tracker.release(epoch, reminder_id)
    }

    /// Epoch of the current episode
    ///
    /// Changes whenever an episode starts or ends, even when a later episode
    /// reuses the same key.
    pub fn episode_epoch(&self) -> u64 {
        self.tracker.current_epoch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoping_domain::EARTH_RADIUS_METERS;

    const P: Coordinate = Coordinate::new_unchecked(51.5, -0.12);

    fn north_of(meters: f64) -> Coordinate {
        let degrees = (meters / EARTH_RADIUS_METERS).to_degrees();
        Coordinate::new_unchecked(P.latitude + degrees, P.longitude)
    }

    fn reminder(id: u64, meters: f64, radius: i64) -> ReminderGeofence {
        ReminderGeofence::new(
            ReminderId::new(id),
            format!("Reminder {}", id),
            Some(north_of(meters)),
            radius,
        )
    }

    fn ids(notifications: &[Notification]) -> Vec<u64> {
        notifications.iter().map(|n| n.reminder_id.value()).collect()
    }

    #[test]
    fn test_no_point_no_notifications() {
        let mut engine = GeofenceEngine::default_config();
        assert!(engine.replace_reminders(vec![reminder(1, 0.0, 100)]).is_empty());
        assert!(engine.triggered().is_empty());
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut engine = GeofenceEngine::default_config();
        engine.replace_reminders(vec![reminder(1, 10.0, 100), reminder(2, 20.0, 100)]);

        let first = engine.set_resolved_point(ResolvedPoint::at(P));
        assert_eq!(ids(&first), vec![1, 2]);

        assert!(engine.recompute().is_empty());
        assert!(engine.replace_reminders(engine.reminders().to_vec()).is_empty());
        assert_eq!(engine.metrics().dispatched, 2);
        assert_eq!(engine.metrics().duplicates_suppressed, 4);
    }

    #[test]
    fn test_new_reminder_in_same_episode() {
        let mut engine = GeofenceEngine::default_config();
        engine.replace_reminders(vec![reminder(1, 10.0, 100)]);
        engine.set_resolved_point(ResolvedPoint::at(P));

        let added = engine.replace_reminders(vec![reminder(1, 10.0, 100), reminder(7, 30.0, 100)]);

        assert_eq!(ids(&added), vec![7]);
    }

    #[test]
    fn test_active_toggle_reveals_inactive() {
        let mut engine = GeofenceEngine::default_config();
        engine.replace_reminders(vec![
            reminder(1, 10.0, 100),
            reminder(2, 10.0, 100).with_active(false),
        ]);

        assert_eq!(ids(&engine.set_resolved_point(ResolvedPoint::at(P))), vec![1]);
        assert_eq!(ids(&engine.set_active_only(false)), vec![2]);
        assert!(engine.set_active_only(true).is_empty());
        assert!(engine.set_active_only(false).is_empty());
    }

    #[test]
    fn test_permission_grant_dispatches_pending() {
        let mut engine = GeofenceEngine::new(EngineConfig::muted());
        engine.replace_reminders(vec![reminder(1, 10.0, 100), reminder(2, 10.0, 100)]);

        assert!(engine.set_resolved_point(ResolvedPoint::at(P)).is_empty());
        assert_eq!(engine.metrics().pending_permission, 2);

        assert_eq!(ids(&engine.set_permission(true)), vec![1, 2]);
        assert!(engine.set_permission(true).is_empty());
    }

    #[test]
    fn test_resolution_starts_new_episode_each_time() {
        let mut engine = GeofenceEngine::default_config();
        engine.replace_reminders(vec![reminder(1, 10.0, 100)]);

        let first = engine.apply_resolution("SW1A 1AA", Ok(P));
        let second = engine.apply_resolution("SW1A 1AA", Ok(P));

        match (first, second) {
            (
                ResolutionOutcome::Resolved { point: a, notifications: na },
                ResolutionOutcome::Resolved { point: b, notifications: nb },
            ) => {
                assert_ne!(a.episode, b.episode);
                assert_eq!(ids(&na), vec![1]);
                assert_eq!(ids(&nb), vec![1]);
            }
            other => panic!("unexpected outcomes: {:?}", other),
        }
        assert_eq!(engine.metrics().episodes_started, 2);
    }

    #[test]
    fn test_same_point_keeps_episode() {
        let mut engine = GeofenceEngine::default_config();
        engine.replace_reminders(vec![reminder(1, 10.0, 100)]);

        assert_eq!(engine.set_resolved_point(ResolvedPoint::at(P)).len(), 1);
        assert!(engine.set_resolved_point(ResolvedPoint::at(P)).is_empty());
    }

    #[test]
    fn test_failed_resolution_clears() {
        let mut engine = GeofenceEngine::default_config();
        engine.replace_reminders(vec![reminder(1, 10.0, 100)]);
        engine.apply_resolution("N1 1AA", Ok(P));

        let outcome = engine.apply_resolution("ZZ99 9ZZ", Err(ResolveError::NotFound));

        assert_eq!(
            outcome,
            ResolutionOutcome::Cleared {
                reason: ResolveError::NotFound
            }
        );
        assert!(engine.resolved_point().is_none());
        assert!(engine.triggered().is_empty());
        assert_eq!(engine.tracker().current_episode(), None);
        assert_eq!(engine.tracker().notified_count(), 0);
        assert_eq!(engine.metrics().episodes_ended, 1);
        assert_eq!(engine.metrics().resolution_failures, 1);
    }

    #[test]
    fn test_release_failed_redelivers() {
        let mut engine = GeofenceEngine::default_config();
        engine.replace_reminders(vec![reminder(1, 10.0, 100)]);
        let sent = engine.set_resolved_point(ResolvedPoint::at(P));
        let epoch = engine.episode_epoch();

        assert!(engine.release_failed(epoch, sent[0].reminder_id));
        assert_eq!(ids(&engine.recompute()), vec![1]);
        assert!(engine.recompute().is_empty());
    }

    #[test]
    fn test_late_failure_from_earlier_visit_not_redelivered() {
        let mut engine = GeofenceEngine::default_config();
        engine.replace_reminders(vec![reminder(1, 10.0, 100)]);

        assert_eq!(ids(&engine.set_resolved_point(ResolvedPoint::at(P))), vec![1]);
        let first_visit = engine.episode_epoch();

        assert!(engine.set_resolved_point(ResolvedPoint::at(north_of(5_000.0))).is_empty());
        assert_eq!(ids(&engine.set_resolved_point(ResolvedPoint::at(P))), vec![1]);

        // Failure report for the first visit arrives after the second one succeeded
        assert!(!engine.release_failed(first_visit, ReminderId::new(1)));
        assert!(engine.recompute().is_empty());
        assert!(engine.tracker().is_notified(ReminderId::new(1)));
    }

    #[test]
    fn test_notification_content() {
        let mut engine = GeofenceEngine::default_config();
        engine.replace_reminders(vec![reminder(4, 80.0, 100).with_label("SW1A 1AA")]);

        let sent = engine.set_resolved_point(ResolvedPoint::at(P));

        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "Reminder triggered: Reminder 4");
        assert_eq!(sent[0].body, "Postcode: SW1A 1AA • Distance: 80m • Radius: 100m");
    }
}
