//! Geoping Storage Layer
//!
//! Implements the ReminderStore trait on top of SQLite.
//!
//! # Architecture
//!
//! - One `reminders` table; ids are assigned by SQLite (`AUTOINCREMENT`)
//! - Anchors are stored as nullable latitude/longitude columns
//! - Listing order is newest first (id descending)
//!
//! # Examples
//!
//! ```no_run
//! use geoping_store::{NewReminder, SqliteReminderStore};
//!
//! let mut store = SqliteReminderStore::new(":memory:").unwrap();
//! let id = store.insert(NewReminder::new("Buy milk", 150)).unwrap();
//! assert!(store.get(id).unwrap().is_some());
//! ```

#![warn(missing_docs)]

use geoping_domain::traits::ReminderStore;
use geoping_domain::{Coordinate, ReminderGeofence, ReminderId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Reminder not found
    #[error("Reminder not found: {0}")]
    NotFound(ReminderId),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Fields for a reminder that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewReminder {
    /// Display title (must not be blank)
    pub title: String,

    /// Free-form notes
    pub notes: String,

    /// Geofence radius in meters
    pub radius_meters: i64,

    /// Where the anchor came from, usually a postcode
    pub location_label: Option<String>,

    /// Geofence center
    pub anchor: Option<Coordinate>,

    /// Whether the reminder starts switched on
    pub is_active: bool,
}

impl NewReminder {
    /// Active reminder with no notes, label or anchor
    pub fn new(title: impl Into<String>, radius_meters: i64) -> Self {
        Self {
            title: title.into(),
            notes: String::new(),
            radius_meters,
            location_label: None,
            anchor: None,
            is_active: true,
        }
    }

    /// Attach an anchor and the label it was resolved from
    pub fn at(mut self, anchor: Coordinate, label: Option<String>) -> Self {
        self.anchor = Some(anchor);
        self.location_label = label;
        self
    }

    /// Set the notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Set the active flag
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// SQLite-based implementation of ReminderStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteReminderStore instance.
pub struct SqliteReminderStore {
    conn: Connection,
}

const SELECT_COLUMNS: &str =
    "SELECT id, title, notes, radius_meters, location_label, latitude, longitude, is_active
     FROM reminders";

impl SqliteReminderStore {
    /// Open (or create) the store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use geoping_store::SqliteReminderStore;
    ///
    /// let store = SqliteReminderStore::new("geoping.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn validate_title(title: &str) -> Result<(), StoreError> {
        if title.trim().is_empty() {
            return Err(StoreError::InvalidData("Title must not be empty".to_string()));
        }
        Ok(())
    }

    fn id_to_sql(id: ReminderId) -> Result<i64, StoreError> {
        i64::try_from(id.value())
            .map_err(|_| StoreError::InvalidData(format!("Reminder id out of range: {}", id)))
    }

    fn row_to_reminder(row: &Row<'_>) -> rusqlite::Result<ReminderGeofence> {
        let id: i64 = row.get(0)?;
        let latitude: Option<f64> = row.get(5)?;
        let longitude: Option<f64> = row.get(6)?;

        let anchor = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    rusqlite::types::Type::Real,
                    Box::new(StoreError::InvalidData(e)),
                )
            })?),
            _ => None,
        };

        Ok(ReminderGeofence {
            id: ReminderId::new(id as u64),
            title: row.get(1)?,
            notes: row.get(2)?,
            radius_meters: row.get(3)?,
            location_label: row.get(4)?,
            anchor,
            is_active: row.get(7)?,
        })
    }

    /// Store a new reminder and return its assigned id
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidData`] if the title is blank.
    pub fn insert(&mut self, reminder: NewReminder) -> Result<ReminderId, StoreError> {
        Self::validate_title(&reminder.title)?;

        self.conn.execute(
            "INSERT INTO reminders (title, notes, radius_meters, location_label, latitude, longitude, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                reminder.title.trim(),
                &reminder.notes,
                reminder.radius_meters,
                &reminder.location_label,
                reminder.anchor.map(|c| c.latitude),
                reminder.anchor.map(|c| c.longitude),
                reminder.is_active,
            ],
        )?;

        let id = ReminderId::new(self.conn.last_insert_rowid() as u64);
        tracing::debug!("Inserted reminder {}", id);
        Ok(id)
    }

    /// Overwrite every field of an existing reminder
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no reminder has this id and
    /// [`StoreError::InvalidData`] if the title is blank.
    pub fn update(&mut self, reminder: &ReminderGeofence) -> Result<(), StoreError> {
        Self::validate_title(&reminder.title)?;

        let changed = self.conn.execute(
            "UPDATE reminders
             SET title = ?2, notes = ?3, radius_meters = ?4, location_label = ?5,
                 latitude = ?6, longitude = ?7, is_active = ?8
             WHERE id = ?1",
            params![
                Self::id_to_sql(reminder.id)?,
                reminder.title.trim(),
                &reminder.notes,
                reminder.radius_meters,
                &reminder.location_label,
                reminder.anchor.map(|c| c.latitude),
                reminder.anchor.map(|c| c.longitude),
                reminder.is_active,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(reminder.id));
        }
        Ok(())
    }

    /// Switch a reminder on or off
    pub fn set_active(&mut self, id: ReminderId, is_active: bool) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE reminders SET is_active = ?2 WHERE id = ?1",
            params![Self::id_to_sql(id)?, is_active],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    /// Delete a reminder
    ///
    /// Returns `false` if there was nothing to delete.
    pub fn delete(&mut self, id: ReminderId) -> Result<bool, StoreError> {
        let changed = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?1", params![Self::id_to_sql(id)?])?;
        Ok(changed > 0)
    }

    /// Fetch a single reminder
    pub fn get(&self, id: ReminderId) -> Result<Option<ReminderGeofence>, StoreError> {
        let reminder = self
            .conn
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![Self::id_to_sql(id)?],
                Self::row_to_reminder,
            )
            .optional()?;
        Ok(reminder)
    }

    /// All reminders, newest first
    pub fn list(&self) -> Result<Vec<ReminderGeofence>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id DESC", SELECT_COLUMNS))?;
        let reminders = stmt
            .query_map([], Self::row_to_reminder)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(reminders)
    }
}

impl ReminderStore for SqliteReminderStore {
    type Error = StoreError;

    fn snapshot(&self) -> Result<Vec<ReminderGeofence>, Self::Error> {
        self.list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_title_rejected() {
        assert!(SqliteReminderStore::validate_title("   ").is_err());
        assert!(SqliteReminderStore::validate_title("Milk").is_ok());
    }

    #[test]
    fn test_id_out_of_range() {
        assert!(SqliteReminderStore::id_to_sql(ReminderId::new(u64::MAX)).is_err());
        assert_eq!(SqliteReminderStore::id_to_sql(ReminderId::new(7)).unwrap(), 7);
    }
}
