//! At-most-once notification tracking per episode

use geoping_domain::{EpisodeKey, ReminderId, TriggerEntry};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct TrackerState {
    episode: Option<EpisodeKey>,
    // Bumped on every episode start and every clear; a reused key gets a new epoch
    epoch: u64,
    notified: HashSet<ReminderId>,
}

/// What a single [`DedupTracker::advance_with_report`] call decided
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdvanceReport {
    /// Entries to dispatch now, in input order
    pub dispatch: Vec<TriggerEntry>,

    /// Whether this call started a new episode
    pub episode_started: bool,

    /// Epoch of the episode the dispatched entries belong to
    ///
    /// Pass it back to [`DedupTracker::release`] if a delivery fails.
    pub epoch: u64,

    /// Entries skipped because they were already notified in this episode
    pub already_notified: usize,

    /// Entries skipped because notifications are not permitted yet
    pub pending: usize,
}

/// Converts ranked trigger lists into new dispatch actions
///
/// Each reminder id is emitted at most once per episode, across any number of
/// calls. Entries withheld because notifications are not permitted stay
/// pending and are emitted by the first later call that is allowed to notify,
/// as long as the episode has not changed.
///
/// All state lives behind a mutex, so concurrent calls on one tracker never
/// emit the same id twice.
///
/// # Examples
///
/// ```
/// use geoping_domain::{EpisodeKey, ReminderId, TriggerEntry};
/// use geoping_engine::DedupTracker;
///
/// let tracker = DedupTracker::new();
/// let episode = EpisodeKey::new("q1:SW1A1AA");
/// let entries = vec![TriggerEntry::new(ReminderId::new(1), 12.0)];
///
/// assert_eq!(tracker.advance(&episode, &entries, true).len(), 1);
/// assert!(tracker.advance(&episode, &entries, true).is_empty());
/// ```
#[derive(Debug, Default)]
pub struct DedupTracker {
    state: Mutex<TrackerState>,
}

impl DedupTracker {
    /// Create a tracker with no episode
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the set half-updated, so
    // recovering the guard from a poisoned mutex is sound.
    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide which entries to dispatch now
    ///
    /// Switching to a different `episode` discards all previous state first.
    pub fn advance(
        &self,
        episode: &EpisodeKey,
        entries: &[TriggerEntry],
        can_notify: bool,
    ) -> Vec<TriggerEntry> {
        self.advance_with_report(episode, entries, can_notify).dispatch
    }

    /// Like [`advance`](Self::advance), also reporting why entries were skipped
    pub fn advance_with_report(
        &self,
        episode: &EpisodeKey,
        entries: &[TriggerEntry],
        can_notify: bool,
    ) -> AdvanceReport {
        let mut state = self.lock();
        let mut report = AdvanceReport::default();

        if state.episode.as_ref() != Some(episode) {
            state.episode = Some(episode.clone());
            state.epoch += 1;
            state.notified.clear();
            report.episode_started = true;
        }
        report.epoch = state.epoch;

        for entry in entries {
            if state.notified.contains(&entry.reminder_id) {
                report.already_notified += 1;
            } else if !can_notify {
                report.pending += 1;
            } else {
                state.notified.insert(entry.reminder_id);
                report.dispatch.push(*entry);
            }
        }

        report
    }

    /// End the current episode and forget everything notified in it
    ///
    /// Returns `true` if an episode was active.
    pub fn clear(&self) -> bool {
        let mut state = self.lock();
        state.notified.clear();
        state.epoch += 1;
        state.episode.take().is_some()
    }

    /// Return a reminder to the pending state after its delivery failed
    ///
    /// Only applies while the episode identified by `epoch` (as reported by
    /// [`advance_with_report`](Self::advance_with_report)) is still current.
    /// A later episode with the same key has a different epoch and is left
    /// alone. Returns `true` if the reminder had been marked as notified.
    pub fn release(&self, epoch: u64, reminder_id: ReminderId) -> bool {
        let mut state = self.lock();
        if state.episode.is_none() || state.epoch != epoch {
            return false;
        }
        state.notified.remove(&reminder_id)
    }

    /// Episode the tracker currently holds
    pub fn current_episode(&self) -> Option<EpisodeKey> {
        self.lock().episode.clone()
    }

    /// Epoch of the current episode, or of the last clear
    pub fn current_epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Whether `reminder_id` was already notified in the current episode
    pub fn is_notified(&self, reminder_id: ReminderId) -> bool {
        self.lock().notified.contains(&reminder_id)
    }

    /// Number of reminders notified in the current episode
    pub fn notified_count(&self) -> usize {
        self.lock().notified.len()
    }
}
