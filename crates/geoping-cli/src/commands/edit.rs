//! Edit command implementation.

use super::add::{resolve_location, validate_radius};
use crate::cli::EditArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use geoping_domain::traits::LocationResolver;
use geoping_store::{SqliteReminderStore, StoreError};

/// Execute the edit command.
pub async fn execute_edit<R: LocationResolver>(
    args: EditArgs,
    store: &mut SqliteReminderStore,
    resolver: &R,
    formatter: &Formatter,
) -> Result<()> {
    let mut reminder = store.get(args.id)?.ok_or(StoreError::NotFound(args.id))?;

    if args.title.is_none()
        && args.radius.is_none()
        && args.notes.is_none()
        && !args.location.is_set()
        && !args.clear_location
    {
        return Err(CliError::InvalidInput("Nothing to change".to_string()));
    }

    if let Some(title) = args.title {
        reminder.title = title;
    }
    if let Some(radius) = args.radius {
        validate_radius(radius)?;
        reminder.radius_meters = radius;
    }
    if let Some(notes) = args.notes {
        reminder.notes = notes;
    }
    if args.clear_location {
        reminder.anchor = None;
        reminder.location_label = None;
    } else if let Some((anchor, label)) = resolve_location(&args.location, resolver).await? {
        reminder.anchor = Some(anchor);
        reminder.location_label = label;
    }

    store.update(&reminder)?;
    println!("{}", formatter.success(&format!("Reminder {} updated", reminder.id)));
    if reminder.anchor.is_none() {
        println!(
            "{}",
            formatter.warning("No location set; the reminder will not trigger until one is added")
        );
    }
    Ok(())
}
