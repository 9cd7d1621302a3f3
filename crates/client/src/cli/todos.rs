//! TODO CLI commands.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use todoapi_core::todo::{Payload, Priority};

/// TODO management commands.
#[derive(Debug, Parser)]
pub struct TodosCommand {
    #[command(subcommand)]
    pub action: TodosAction,
}

/// Available TODO actions.
#[derive(Debug, Subcommand)]
pub enum TodosAction {
    /// List TODOs, newest first.
    List {
        /// Only completed (true) or open (false) TODOs.
        #[arg(long)]
        completed: Option<bool>,
        /// Only TODOs with this priority (0-4).
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
    },
    /// Create a new TODO.
    Create {
        /// TODO title.
        #[arg(long)]
        title: String,
        /// TODO description.
        #[arg(long)]
        description: Option<String>,
        /// Priority from 0 (critical) to 4 (backlog).
        #[arg(long, default_value = "2", value_parser = parse_priority)]
        priority: Priority,
        /// Due date (RFC 3339).
        #[arg(long)]
        due_date: Option<DateTime<Utc>>,
        /// JSON object attached to the TODO.
        #[arg(long, value_parser = parse_payload)]
        payload: Option<Payload>,
    },
    /// Get TODO by ID.
    Get {
        /// TODO ID.
        id: i64,
    },
    /// Update a TODO. Omitted fields are left unchanged.
    Update {
        /// TODO ID.
        id: i64,
        /// New title.
        #[arg(long)]
        title: Option<String>,
        /// New description.
        #[arg(long)]
        description: Option<String>,
        /// Mark as completed or open.
        #[arg(long)]
        completed: Option<bool>,
        /// New priority (0-4).
        #[arg(long, value_parser = parse_priority)]
        priority: Option<Priority>,
        /// New due date (RFC 3339).
        #[arg(long)]
        due_date: Option<DateTime<Utc>>,
        /// New JSON payload.
        #[arg(long, value_parser = parse_payload)]
        payload: Option<Payload>,
    },
    /// Delete TODO by ID.
    Delete {
        /// TODO ID.
        id: i64,
    },
}

/// Parses a priority from its integer form.
pub fn parse_priority(s: &str) -> Result<Priority, String> {
    let value: i64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid priority '{s}', expected 0-4"))?;
    Priority::try_from(value).map_err(|e| e.message)
}

/// Parses a JSON object.
pub fn parse_payload(s: &str) -> Result<Payload, String> {
    match serde_json::from_str::<serde_json::Value>(s) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(_) => Err("payload must be a JSON object".to_string()),
        Err(e) => Err(format!("invalid JSON: {e}")),
    }
}
