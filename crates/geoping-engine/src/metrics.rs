//! Metrics collection for engine operations

/// Counters collected while the engine evaluates and dispatches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// Recomputations performed
    pub evaluations: usize,

    /// Notifications handed to the sink
    pub dispatched: usize,

    /// Triggered entries skipped because they were already notified this episode
    pub duplicates_suppressed: usize,

    /// Triggered entries held back because notifications were not permitted
    pub pending_permission: usize,

    /// Episodes started (new resolved location)
    pub episodes_started: usize,

    /// Episodes ended (location cleared or failed to resolve)
    pub episodes_ended: usize,

    /// Location queries that failed to resolve
    pub resolution_failures: usize,

    /// Resolution results dropped because a newer request superseded them
    pub stale_resolutions: usize,

    /// Sink deliveries that failed
    pub delivery_failures: usize,
}

impl EngineMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a recomputation
    pub fn record_evaluation(&mut self) {
        self.evaluations += 1;
    }

    /// Record notifications handed to the sink
    pub fn record_dispatched(&mut self, count: usize) {
        self.dispatched += count;
    }

    /// Record entries skipped as duplicates
    pub fn record_suppressed(&mut self, count: usize) {
        self.duplicates_suppressed += count;
    }

    /// Record entries withheld for lack of permission
    pub fn record_pending(&mut self, count: usize) {
        self.pending_permission += count;
    }

    /// Record the start of an episode
    pub fn record_episode_start(&mut self) {
        self.episodes_started += 1;
    }

    /// Record the end of an episode
    pub fn record_episode_end(&mut self) {
        self.episodes_ended += 1;
    }

    /// Record a failed resolution
    pub fn record_resolution_failure(&mut self) {
        self.resolution_failures += 1;
    }

    /// Record a superseded resolution result
    pub fn record_stale_resolution(&mut self) {
        self.stale_resolutions += 1;
    }

    /// Record a failed delivery
    pub fn record_delivery_failure(&mut self) {
        self.delivery_failures += 1;
    }

    /// Reset all counters
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        [
            "Geofence Engine Metrics".to_string(),
            "=======================".to_string(),
            format!("Evaluations: {}", self.evaluations),
            format!("Dispatched: {}", self.dispatched),
            format!("Duplicates suppressed: {}", self.duplicates_suppressed),
            format!("Pending permission: {}", self.pending_permission),
            format!(
                "Episodes: {} started, {} ended",
                self.episodes_started, self.episodes_ended
            ),
            format!("Resolution failures: {}", self.resolution_failures),
            format!("Stale resolutions: {}", self.stale_resolutions),
            format!("Delivery failures: {}", self.delivery_failures),
        ]
        .join("\n")
    }
}
