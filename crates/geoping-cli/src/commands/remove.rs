//! Remove command implementation.

use crate::cli::IdArgs;
use crate::error::Result;
use crate::output::Formatter;
use geoping_store::SqliteReminderStore;

/// Execute the remove command.
pub fn execute_remove(
    args: IdArgs,
    store: &mut SqliteReminderStore,
    formatter: &Formatter,
) -> Result<()> {
    if store.delete(args.id)? {
        println!("{}", formatter.success(&format!("Reminder {} removed", args.id)));
    } else {
        println!("{}", formatter.warning(&format!("No reminder with ID {}", args.id)));
    }
    Ok(())
}
