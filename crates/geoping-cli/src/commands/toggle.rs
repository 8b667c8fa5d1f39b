//! Toggle command implementation.

use crate::cli::IdArgs;
use crate::error::Result;
use crate::output::Formatter;
use geoping_store::{SqliteReminderStore, StoreError};

/// Execute the toggle command.
pub fn execute_toggle(
    args: IdArgs,
    store: &mut SqliteReminderStore,
    formatter: &Formatter,
) -> Result<()> {
    let reminder = store.get(args.id)?.ok_or(StoreError::NotFound(args.id))?;
    let is_active = !reminder.is_active;
    store.set_active(args.id, is_active)?;

    let state = if is_active { "on" } else { "off" };
    println!(
        "{}",
        formatter.success(&format!("Reminder {} switched {}", args.id, state))
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::CliError;
    use geoping_domain::ReminderId;
    use geoping_store::NewReminder;

    fn formatter() -> Formatter {
        Formatter::new(OutputFormat::Quiet, false)
    }

    #[test]
    fn test_toggle_flips_active() {
        let mut store = SqliteReminderStore::new(":memory:").unwrap();
        let id = store.insert(NewReminder::new("Buy milk", 100)).unwrap();
        let other = store.insert(NewReminder::new("Post letter", 100)).unwrap();

        execute_toggle(IdArgs { id }, &mut store, &formatter()).unwrap();
        assert!(!store.get(id).unwrap().unwrap().is_active);
        assert!(store.get(other).unwrap().unwrap().is_active);

        execute_toggle(IdArgs { id }, &mut store, &formatter()).unwrap();
        assert!(store.get(id).unwrap().unwrap().is_active);
    }

    #[test]
    fn test_toggle_missing_reminder() {
        let mut store = SqliteReminderStore::new(":memory:").unwrap();

        let result = execute_toggle(
            IdArgs {
                id: ReminderId::new(42),
            },
            &mut store,
            &formatter(),
        );

        assert!(matches!(result, Err(CliError::Store(StoreError::NotFound(_)))));
    }
}
