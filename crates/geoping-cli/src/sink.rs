//! Notification sink that prints to the terminal.

use crate::output::Formatter;
use geoping_domain::traits::NotificationSink;
use geoping_domain::Notification;
use std::io::{self, Write};

/// Prints each notification to stdout.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
    formatter: Formatter,
}

impl ConsoleSink {
    /// Create a sink printing with `formatter`.
    pub fn new(formatter: Formatter) -> Self {
        Self { formatter }
    }
}

impl NotificationSink for ConsoleSink {
    type Error = io::Error;

    async fn dispatch(&self, notification: &Notification) -> Result<(), Self::Error> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", self.formatter.notification(notification))?;
        stdout.flush()
    }
}
