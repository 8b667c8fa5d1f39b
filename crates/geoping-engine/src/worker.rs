//! Background worker driving the engine from commands and async collaborators

use crate::{EngineConfig, EngineError, EngineMetrics, GeofenceEngine, ResolutionOutcome};
use geoping_domain::traits::{LocationResolver, NotificationSink, ReminderStore};
use geoping_domain::{Coordinate, Notification, ResolveError, ResolvedPoint, TriggerEntry};
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Input changes the worker reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Resolve a location query; supersedes any resolution still in flight
    Resolve(String),
    /// Clear the current location and end the episode
    Clear,
    /// Reload the reminder snapshot from the store
    RefreshReminders,
    /// Toggle the active-only filter
    SetActiveOnly(bool),
    /// Update notification permission
    SetPermission(bool),
    /// Stop the worker
    Shutdown,
}

/// What the worker reports back to observers
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A query resolved and a new episode started
    Resolved {
        /// The query that was resolved
        query: String,
        /// Where it resolved to
        point: ResolvedPoint,
        /// Reminders triggered at that point
        triggered: Vec<TriggerEntry>,
    },
    /// The location was cleared, explicitly (`reason == None`) or by a failed resolution
    Cleared {
        /// Resolution failure that caused the clear, if any
        reason: Option<ResolveError>,
    },
    /// A resolution result arrived after a newer request and was dropped
    Superseded {
        /// The query whose result was dropped
        query: String,
    },
    /// Inputs other than the location changed and the triggered list was recomputed
    Updated {
        /// Reminders triggered after the change
        triggered: Vec<TriggerEntry>,
    },
    /// A notification reached the sink
    Delivered(Notification),
    /// A notification could not be delivered and is pending again
    DeliveryFailed {
        /// The notification that failed
        notification: Notification,
        /// Sink error message
        error: String,
    },
}

/// Cloneable handle for sending commands to an [`EngineWorker`]
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Send a raw command
    pub async fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::Worker("engine worker has stopped".to_string()))
    }

    /// Resolve `query` as the new current location
    pub async fn resolve(&self, query: impl Into<String>) -> Result<(), EngineError> {
        self.send(EngineCommand::Resolve(query.into())).await
    }

    /// Clear the current location
    pub async fn clear(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Clear).await
    }

    /// Reload reminders from the store
    pub async fn refresh(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::RefreshReminders).await
    }

    /// Toggle the active-only filter
    pub async fn set_active_only(&self, active_only: bool) -> Result<(), EngineError> {
        self.send(EngineCommand::SetActiveOnly(active_only)).await
    }

    /// Update notification permission
    pub async fn set_permission(&self, can_notify: bool) -> Result<(), EngineError> {
        self.send(EngineCommand::SetPermission(can_notify)).await
    }

    /// Ask the worker to stop
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Shutdown).await
    }
}

struct ResolutionResult {
    request: u64,
    query: String,
    result: Result<Coordinate, ResolveError>,
}

struct DeliveryResult {
    epoch: u64,
    notification: Notification,
    result: Result<(), String>,
}

/// Background worker that owns the engine and its collaborators
///
/// All engine state is mutated on the worker's own task. Location
/// resolution and notification delivery run in spawned tasks and report
/// back over internal channels, so a slow resolver or sink never blocks
/// evaluation. Only the result of the most recent resolve or clear request
/// is applied.
///
/// # Examples
///
/// ```no_run
/// use geoping_engine::{EngineConfig, EngineWorker, TracingSink};
/// # use geoping_domain::{Coordinate, ReminderGeofence, ResolveError};
/// # use geoping_domain::traits::{LocationResolver, ReminderStore};
/// # struct Resolver;
/// # impl LocationResolver for Resolver {
/// #     async fn resolve(&self, _q: &str) -> Result<Coordinate, ResolveError> { Err(ResolveError::NotFound) }
/// # }
/// # struct Store;
/// # impl ReminderStore for Store {
/// #     type Error = String;
/// #     fn snapshot(&self) -> Result<Vec<ReminderGeofence>, String> { Ok(Vec::new()) }
/// # }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let (mut worker, handle) = EngineWorker::new(EngineConfig::default(), Resolver, Store, TracingSink);
///
///     handle.resolve("SW1A 1AA").await?;
///     handle.shutdown().await?;
///
///     worker.run().await?;
///     Ok(())
/// }
/// ```
pub struct EngineWorker<R, S, N> {
    engine: GeofenceEngine,
    resolver: Arc<R>,
    store: S,
    sink: Arc<N>,
    commands: mpsc::Receiver<EngineCommand>,
    resolutions_tx: mpsc::UnboundedSender<ResolutionResult>,
    resolutions_rx: mpsc::UnboundedReceiver<ResolutionResult>,
    deliveries_tx: mpsc::UnboundedSender<DeliveryResult>,
    deliveries_rx: mpsc::UnboundedReceiver<DeliveryResult>,
    events: Option<mpsc::UnboundedSender<EngineEvent>>,
    latest_request: u64,
}

impl<R, S, N> EngineWorker<R, S, N>
where
    R: LocationResolver + Send + Sync + 'static,
    S: ReminderStore,
    S::Error: Display,
    N: NotificationSink + Send + Sync + 'static,
    N::Error: Display,
{
    /// Create a worker and the handle used to drive it
    ///
    /// A zero `command_buffer` is raised to one.
    pub fn new(config: EngineConfig, resolver: R, store: S, sink: N) -> (Self, EngineHandle) {
        let (commands_tx, commands) = mpsc::channel(config.command_buffer.max(1));
        let (resolutions_tx, resolutions_rx) = mpsc::unbounded_channel();
        let (deliveries_tx, deliveries_rx) = mpsc::unbounded_channel();

        let worker = Self {
            engine: GeofenceEngine::new(config),
            resolver: Arc::new(resolver),
            store,
            sink: Arc::new(sink),
            commands,
            resolutions_tx,
            resolutions_rx,
            deliveries_tx,
            deliveries_rx,
            events: None,
            latest_request: 0,
        };
        (worker, EngineHandle { commands: commands_tx })
    }

    /// Subscribe to worker events
    ///
    /// Only one subscriber is supported; subscribing again replaces it.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<EngineEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// The engine owned by this worker
    pub fn engine(&self) -> &GeofenceEngine {
        &self.engine
    }

    /// Current metrics
    pub fn metrics(&self) -> &EngineMetrics {
        self.engine.metrics()
    }

    /// Run until a shutdown command arrives or every handle is dropped
    ///
    /// Loads the initial reminder snapshot first.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial snapshot cannot be loaded. Later store
    /// failures are logged and the previous snapshot is kept.
    pub async fn run(&mut self) -> Result<(), EngineError> {
        self.load_reminders()?;
        tracing::info!(
            "Engine worker started ({} reminders)",
            self.engine.reminders().len()
        );

        loop {
            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        None | Some(EngineCommand::Shutdown) => break,
                        Some(command) => self.handle_command(command),
                    }
                }
                Some(resolution) = self.resolutions_rx.recv() => {
                    self.handle_resolution(resolution);
                }
                Some(delivery) = self.deliveries_rx.recv() => {
                    self.handle_delivery(delivery);
                }
            }
        }

        tracing::info!(
            "Engine worker stopped. Final metrics:\n{}",
            self.engine.metrics().summary()
        );
        Ok(())
    }

    fn handle_command(&mut self, command: EngineCommand) {
        tracing::debug!("Command: {:?}", command);
        match command {
            EngineCommand::Resolve(query) => self.spawn_resolution(query),
            EngineCommand::Clear => {
                // A clear supersedes any resolution still in flight
                self.latest_request += 1;
                self.engine.clear_resolved_point();
                self.emit(EngineEvent::Cleared { reason: None });
            }
            EngineCommand::RefreshReminders => match self.load_reminders() {
                Ok(notifications) => self.after_update(notifications),
                Err(e) => tracing::error!("Reminder refresh failed: {}", e),
            },
            EngineCommand::SetActiveOnly(active_only) => {
                let notifications = self.engine.set_active_only(active_only);
                self.after_update(notifications);
            }
            EngineCommand::SetPermission(can_notify) => {
                let notifications = self.engine.set_permission(can_notify);
                self.after_update(notifications);
            }
            EngineCommand::Shutdown => {}
        }
    }

    fn load_reminders(&mut self) -> Result<Vec<Notification>, EngineError> {
        let snapshot = self
            .store
            .snapshot()
            .map_err(|e| EngineError::Store(e.to_string()))?;
        Ok(self.engine.replace_reminders(snapshot))
    }

    fn spawn_resolution(&mut self, query: String) {
        self.latest_request += 1;
        let request = self.latest_request;
        let resolver = Arc::clone(&self.resolver);
        let results = self.resolutions_tx.clone();

        tokio::spawn(async move {
            let result = resolver.resolve(&query).await;
            // The worker may have stopped; nothing left to report to
            let _ = results.send(ResolutionResult {
                request,
                query,
                result,
            });
        });
    }

    fn handle_resolution(&mut self, resolution: ResolutionResult) {
        let ResolutionResult {
            request,
            query,
            result,
        } = resolution;

        if request != self.latest_request {
            tracing::debug!("Discarding superseded resolution for '{}'", query);
            self.engine.metrics_mut().record_stale_resolution();
            self.emit(EngineEvent::Superseded { query });
            return;
        }

        match self.engine.apply_resolution(&query, result) {
            ResolutionOutcome::Resolved {
                point,
                notifications,
            } => {
                let triggered = self.engine.triggered();
                self.emit(EngineEvent::Resolved {
                    query,
                    point,
                    triggered,
                });
                self.deliver(notifications);
            }
            ResolutionOutcome::Cleared { reason } => {
                self.emit(EngineEvent::Cleared {
                    reason: Some(reason),
                });
            }
        }
    }

    fn after_update(&mut self, notifications: Vec<Notification>) {
        let triggered = self.engine.triggered();
        self.emit(EngineEvent::Updated { triggered });
        self.deliver(notifications);
    }

    /// Deliver a batch in ranked order on a separate task
    fn deliver(&self, notifications: Vec<Notification>) {
        if notifications.is_empty() {
            return;
        }
        // Notifications always come from the latest recompute, so the
        // current epoch is the one they were reserved in
        let epoch = self.engine.episode_epoch();
        let sink = Arc::clone(&self.sink);
        let results = self.deliveries_tx.clone();

        tokio::spawn(async move {
            for notification in notifications {
                let result = sink
                    .dispatch(&notification)
                    .await
                    .map_err(|e| e.to_string());
                let _ = results.send(DeliveryResult {
                    epoch,
                    notification,
                    result,
                });
            }
        });
    }

    fn handle_delivery(&mut self, delivery: DeliveryResult) {
        let DeliveryResult {
            epoch,
            notification,
            result,
        } = delivery;

        match result {
            Ok(()) => self.emit(EngineEvent::Delivered(notification)),
            Err(error) => {
                tracing::warn!(
                    "Delivery of reminder {} failed: {}",
                    notification.reminder_id,
                    error
                );
                self.engine
                    .release_failed(epoch, notification.reminder_id);
                self.emit(EngineEvent::DeliveryFailed {
                    notification,
                    error,
                });
            }
        }
    }

    fn emit(&self, event: EngineEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}
