//! SQLite row conversion functions.
//!
//! Rows are read into [`TodoRow`] while the query runs and converted into
//! domain types afterwards, so the two phases can be timed separately.

use chrono::{DateTime, Utc};
use rusqlite::Row;

use todoapi_core::storage::RepositoryError;
use todoapi_core::todo::{Payload, Priority, Todo};

/// Storage format for timestamps. Fixed-width microseconds keep lexical order
/// equal to time order.
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// A TODO row as stored, before conversion.
///
/// Expected columns: id, title, description, completed, priority, due_date,
/// payload, created_at, updated_at
#[derive(Debug, Clone)]
pub struct TodoRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: i64,
    pub due_date: Option<String>,
    pub payload: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TodoRow {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            completed: row.get(3)?,
            priority: row.get(4)?,
            due_date: row.get(5)?,
            payload: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    /// Converts the stored representation into a [`Todo`].
    pub fn into_todo(self) -> Result<Todo, RepositoryError> {
        Ok(Todo {
            id: self.id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            priority: Priority::try_from(self.priority)
                .map_err(|e| RepositoryError::InvalidData(e.to_string()))?,
            due_date: self.due_date.as_deref().map(parse_datetime).transpose()?,
            payload: self.payload.as_deref().map(json_to_payload).transpose()?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Converts a batch of rows, failing on the first bad one.
pub fn rows_to_todos(rows: Vec<TodoRow>) -> Result<Vec<Todo>, RepositoryError> {
    rows.into_iter().map(TodoRow::into_todo).collect()
}

/// Format a DateTime for SQLite storage.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

/// Parse a stored timestamp. Accepts any RFC 3339 value, including the
/// millisecond form produced by the column defaults.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::InvalidData(format!("invalid timestamp '{s}': {e}")))
}

pub fn payload_to_json(payload: &Payload) -> Result<String, RepositoryError> {
    serde_json::to_string(payload).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

pub fn json_to_payload(json: &str) -> Result<Payload, RepositoryError> {
    serde_json::from_str(json).map_err(|e| RepositoryError::Serialization(e.to_string()))
}
