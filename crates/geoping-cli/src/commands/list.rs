//! List command implementation.

use crate::error::Result;
use crate::output::Formatter;
use geoping_store::SqliteReminderStore;

/// Execute the list command.
pub fn execute_list(store: &SqliteReminderStore, formatter: &Formatter) -> Result<()> {
    let reminders = store.list()?;
    println!("{}", formatter.format_reminders(&reminders)?);
    Ok(())
}
