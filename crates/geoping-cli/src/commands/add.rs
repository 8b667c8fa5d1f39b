//! Add command implementation.

use crate::cli::{AddArgs, LocationArgs};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use geoping_domain::traits::LocationResolver;
use geoping_domain::Coordinate;
use geoping_store::{NewReminder, SqliteReminderStore};

/// Smallest radius accepted from the command line.
pub const MIN_RADIUS_METERS: i64 = 10;

/// Largest radius accepted from the command line.
pub const MAX_RADIUS_METERS: i64 = 5000;

/// Execute the add command.
pub async fn execute_add<R: LocationResolver>(
    args: AddArgs,
    store: &mut SqliteReminderStore,
    resolver: &R,
    formatter: &Formatter,
) -> Result<()> {
    validate_radius(args.radius)?;

    let mut reminder = NewReminder::new(args.title, args.radius)
        .with_notes(args.notes)
        .with_active(!args.inactive);
    if let Some((anchor, label)) = resolve_location(&args.location, resolver).await? {
        reminder = reminder.at(anchor, label);
    }

    let anchored = reminder.anchor.is_some();
    let id = store.insert(reminder)?;

    println!("{}", formatter.success(&format!("Reminder created: {}", id)));
    if !anchored {
        println!(
            "{}",
            formatter.warning("No location set; the reminder will not trigger until one is added")
        );
    }
    Ok(())
}

/// Check a radius against the accepted range.
pub fn validate_radius(radius: i64) -> Result<()> {
    if !(MIN_RADIUS_METERS..=MAX_RADIUS_METERS).contains(&radius) {
        return Err(CliError::InvalidInput(format!(
            "Radius should be between {} and {} meters",
            MIN_RADIUS_METERS, MAX_RADIUS_METERS
        )));
    }
    Ok(())
}

/// Turn location options into an anchor and its label.
///
/// Postcodes go through the resolver and become the label; raw
/// coordinates have no label.
pub async fn resolve_location<R: LocationResolver>(
    location: &LocationArgs,
    resolver: &R,
) -> Result<Option<(Coordinate, Option<String>)>> {
    if let Some(postcode) = &location.postcode {
        let anchor = resolver
            .resolve(postcode)
            .await
            .map_err(|source| CliError::Resolve {
                query: postcode.clone(),
                source,
            })?;
        return Ok(Some((anchor, Some(postcode.trim().to_uppercase()))));
    }

    match (location.lat, location.lng) {
        (Some(lat), Some(lng)) => {
            let anchor = Coordinate::new(lat, lng).map_err(CliError::InvalidInput)?;
            Ok(Some((anchor, None)))
        }
        _ => Ok(None),
    }
}
