//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use geoping_domain::{Notification, ReminderGeofence, ReminderId, TriggerEntry};
use geoping_engine::EngineEvent;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a reminder list.
    pub fn format_reminders(&self, reminders: &[ReminderGeofence]) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_reminders_json(reminders),
            OutputFormat::Table => Ok(self.format_reminders_table(reminders)),
            OutputFormat::Quiet => Ok(join_ids(reminders.iter().map(|r| r.id))),
        }
    }

    fn format_reminders_json(&self, reminders: &[ReminderGeofence]) -> Result<String> {
        let json: Vec<serde_json::Value> = reminders
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id.value(),
                    "title": r.title,
                    "notes": r.notes,
                    "location_label": r.location_label,
                    "latitude": r.anchor.map(|c| c.latitude),
                    "longitude": r.anchor.map(|c| c.longitude),
                    "radius_meters": r.radius_meters,
                    "is_active": r.is_active,
                })
            })
            .collect();

        Ok(serde_json::to_string_pretty(&json)?)
    }

    fn format_reminders_table(&self, reminders: &[ReminderGeofence]) -> String {
        if reminders.is_empty() {
            return self.colorize("No reminders found.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "Title", "Location", "Radius", "Active"]);

        for reminder in reminders {
            let location = match reminder.anchor {
                Some(anchor) => format!("{} ({})", reminder.label_or_default(), anchor),
                None => "Location not set".to_string(),
            };
            builder.push_record([
                reminder.id.to_string(),
                reminder.title.clone(),
                location,
                format!("{}m", reminder.radius_meters),
                if reminder.is_active { "yes" } else { "no" }.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Format the ranked list of triggered reminders.
    ///
    /// `reminders` supplies titles and radii; entries without a matching
    /// reminder are shown by id only.
    pub fn format_triggered(
        &self,
        triggered: &[TriggerEntry],
        reminders: &[ReminderGeofence],
    ) -> Result<String> {
        let lookup = |id: ReminderId| reminders.iter().find(|r| r.id == id);

        match self.format {
            OutputFormat::Json => {
                let json: Vec<serde_json::Value> = triggered
                    .iter()
                    .map(|entry| {
                        let reminder = lookup(entry.reminder_id);
                        serde_json::json!({
                            "id": entry.reminder_id.value(),
                            "title": reminder.map(|r| r.title.as_str()),
                            "distance_meters": entry.distance_meters,
                            "radius_meters": reminder.map(|r| r.radius_meters),
                        })
                    })
                    .collect();
                Ok(serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Quiet => Ok(join_ids(triggered.iter().map(|e| e.reminder_id))),
            OutputFormat::Table => {
                if triggered.is_empty() {
                    return Ok(self.colorize("No reminders in range.", "yellow"));
                }

                let mut builder = Builder::default();
                builder.push_record(["ID", "Title", "Distance", "Radius"]);
                for entry in triggered {
                    let reminder = lookup(entry.reminder_id);
                    builder.push_record([
                        entry.reminder_id.to_string(),
                        reminder.map(|r| r.title.clone()).unwrap_or_default(),
                        format!("{}m", entry.distance_meters.round() as i64),
                        reminder
                            .map(|r| format!("{}m", r.radius_meters))
                            .unwrap_or_default(),
                    ]);
                }

                let mut table = builder.build();
                table
                    .with(Style::rounded())
                    .with(Modify::new(Rows::first()).with(Alignment::center()));
                Ok(table.to_string())
            }
        }
    }

    /// Format a delivered notification.
    pub fn notification(&self, notification: &Notification) -> String {
        format!(
            "{}\n  {}",
            self.colorize(&format!("🔔 {}", notification.title), "magenta"),
            notification.body
        )
    }

    /// Format a worker event; `None` for events that print nothing.
    ///
    /// Delivered notifications are printed by the sink itself.
    pub fn event(&self, event: &EngineEvent) -> Option<String> {
        match event {
            EngineEvent::Resolved {
                query,
                point,
                triggered,
            } => Some(self.info(&format!(
                "{} is at {}: {} reminder(s) in range",
                query,
                point.coordinate,
                triggered.len()
            ))),
            EngineEvent::Cleared { reason: None } => Some(self.info("Location cleared")),
            EngineEvent::Cleared {
                reason: Some(reason),
            } => Some(self.warning(&format!("Location cleared: {}", reason))),
            EngineEvent::Superseded { query } => {
                Some(self.info(&format!("Ignored stale result for {}", query)))
            }
            EngineEvent::Updated { triggered } => Some(self.info(&format!(
                "{} reminder(s) in range",
                triggered.len()
            ))),
            EngineEvent::Delivered(_) => None,
            EngineEvent::DeliveryFailed {
                notification,
                error,
            } => Some(self.error(&format!(
                "Could not deliver reminder {}: {}",
                notification.reminder_id, error
            ))),
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "magenta" => text.magenta().to_string(),
            _ => text.to_string(),
        }
    }
}

fn join_ids(ids: impl Iterator<Item = ReminderId>) -> String {
    ids.map(|id| id.to_string()).collect::<Vec<_>>().join("\n")
}
