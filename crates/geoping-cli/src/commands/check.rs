//! Check command implementation.

use crate::cli::CheckArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use geoping_domain::traits::LocationResolver;
use geoping_engine::{EngineConfig, GeofenceEngine, ResolutionOutcome};
use geoping_store::SqliteReminderStore;

/// Execute the check command.
///
/// Evaluates the stored reminders once against the resolved postcode and
/// prints the ranked matches. Nothing is delivered.
pub async fn execute_check<R: LocationResolver>(
    args: CheckArgs,
    store: &SqliteReminderStore,
    resolver: &R,
    config: &EngineConfig,
    formatter: &Formatter,
) -> Result<()> {
    let engine = check_postcode(&args, store, resolver, config).await?;
    println!(
        "{}",
        formatter.format_triggered(&engine.triggered(), engine.reminders())?
    );
    Ok(())
}

/// Load the reminders into a muted engine positioned at the postcode.
async fn check_postcode<R: LocationResolver>(
    args: &CheckArgs,
    store: &SqliteReminderStore,
    resolver: &R,
    config: &EngineConfig,
) -> Result<GeofenceEngine> {
    let mut engine = GeofenceEngine::new(EngineConfig {
        active_only: config.active_only && !args.all,
        notifications_enabled: false,
        ..config.clone()
    });
    engine.replace_reminders(store.list()?);

    let result = resolver.resolve(&args.postcode).await;
    match engine.apply_resolution(&args.postcode, result) {
        ResolutionOutcome::Resolved { point, .. } => {
            tracing::debug!("{} resolved to {}", args.postcode, point.coordinate);
            Ok(engine)
        }
        ResolutionOutcome::Cleared { reason } => Err(CliError::Resolve {
            query: args.postcode.clone(),
            source: reason,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use geoping_domain::{Coordinate, ReminderId, ResolveError, EARTH_RADIUS_METERS};
    use geoping_resolver::MockResolver;
    use geoping_store::NewReminder;

    const HERE: Coordinate = Coordinate::new_unchecked(51.5, -0.12);

    fn north_of(meters: f64) -> Coordinate {
        let degrees = (meters / EARTH_RADIUS_METERS).to_degrees();
        Coordinate::new_unchecked(HERE.latitude + degrees, HERE.longitude)
    }

    fn check_args(postcode: &str, all: bool) -> CheckArgs {
        CheckArgs {
            postcode: postcode.to_string(),
            all,
        }
    }

    /// Near active, far active, near inactive
    fn fixture() -> (SqliteReminderStore, MockResolver, [ReminderId; 3]) {
        let mut store = SqliteReminderStore::new(":memory:").unwrap();
        let near = store
            .insert(NewReminder::new("Near", 100).at(north_of(40.0), None))
            .unwrap();
        let far = store
            .insert(NewReminder::new("Far", 100).at(north_of(400.0), None))
            .unwrap();
        let off = store
            .insert(
                NewReminder::new("Off", 100)
                    .at(north_of(20.0), None)
                    .with_active(false),
            )
            .unwrap();

        let resolver = MockResolver::new();
        resolver.add_location("SW1A 1AA", HERE);
        (store, resolver, [near, far, off])
    }

    #[tokio::test]
    async fn test_active_reminders_only_by_default() {
        let (store, resolver, [near, _, _]) = fixture();

        let engine = check_postcode(
            &check_args("SW1A 1AA", false),
            &store,
            &resolver,
            &EngineConfig::default(),
        )
        .await
        .unwrap();

        let ids: Vec<ReminderId> = engine.triggered().iter().map(|e| e.reminder_id).collect();
        assert_eq!(ids, vec![near]);
    }

    #[tokio::test]
    async fn test_all_includes_inactive() {
        let (store, resolver, [near, _, off]) = fixture();

        let engine = check_postcode(
            &check_args("sw1a 1aa", true),
            &store,
            &resolver,
            &EngineConfig::default(),
        )
        .await
        .unwrap();

        let ids: Vec<ReminderId> = engine.triggered().iter().map(|e| e.reminder_id).collect();
        assert_eq!(ids, vec![off, near]);
    }

    #[tokio::test]
    async fn test_check_delivers_nothing() {
        let (store, resolver, _) = fixture();

        let engine = check_postcode(
            &check_args("SW1A 1AA", true),
            &store,
            &resolver,
            &EngineConfig::default(),
        )
        .await
        .unwrap();

        assert!(!engine.can_notify());
        assert_eq!(engine.metrics().dispatched, 0);
        assert_eq!(engine.metrics().pending_permission, 2);
    }

    #[tokio::test]
    async fn test_unknown_postcode() {
        let (store, resolver, _) = fixture();

        let result = execute_check(
            check_args("ZZ99 9ZZ", false),
            &store,
            &resolver,
            &EngineConfig::default(),
            &Formatter::new(OutputFormat::Quiet, false),
        )
        .await;

        match result {
            Err(CliError::Resolve { query, source }) => {
                assert_eq!(query, "ZZ99 9ZZ");
                assert_eq!(source, ResolveError::NotFound);
            }
            other => panic!("Expected Resolve error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prints_matches() {
        let (store, resolver, _) = fixture();

        execute_check(
            check_args("SW1A 1AA", false),
            &store,
            &resolver,
            &EngineConfig::default(),
            &Formatter::new(OutputFormat::Json, false),
        )
        .await
        .unwrap();
    }
}
