//! Schema migrations as data.
//!
//! Migrations are an ordered chain linked by `down_revision`. Each carries
//! its steps per dialect. The server-side runner executes them and records
//! applied revisions in [`HISTORY_TABLE`].

use thiserror::Error;

use super::backend::BackendKind;

/// Table recording applied revisions.
pub const HISTORY_TABLE: &str = "schema_migrations";
/// Table holding TODO rows.
pub const TODOS_TABLE: &str = "todos";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MigrationError {
    #[error("Unknown schema revision '{0}' recorded in the database")]
    UnknownRevision(String),
}

/// One schema change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    /// Idempotent DDL, e.g. `CREATE ... IF NOT EXISTS`.
    Execute(&'static str),
    /// Adds a column unless it already exists.
    AddColumnIfMissing {
        table: &'static str,
        column: &'static str,
        definition: &'static str,
    },
}

/// A revision in the migration chain.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub revision: &'static str,
    pub down_revision: Option<&'static str>,
    pub description: &'static str,
    postgres: &'static [MigrationStep],
    sqlite: &'static [MigrationStep],
}

impl Migration {
    /// Steps for the given dialect.
    pub fn steps(&self, kind: BackendKind) -> &'static [MigrationStep] {
        match kind {
            BackendKind::Postgres => self.postgres,
            BackendKind::Sqlite => self.sqlite,
        }
    }
}

const CREATE_TODOS_POSTGRES: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id SERIAL PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    completed BOOLEAN NOT NULL DEFAULT false,
    priority INTEGER NOT NULL DEFAULT 2,
    due_date TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
)
"#;

const CREATE_TODOS_SQLITE: &str = r#"
CREATE TABLE IF NOT EXISTS todos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    completed BOOLEAN NOT NULL DEFAULT 0,
    priority INTEGER NOT NULL DEFAULT 2,
    due_date TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

const CREATE_INDEXES: &[MigrationStep] = &[
    MigrationStep::Execute(
        "CREATE INDEX IF NOT EXISTS idx_todos_completed ON todos (completed)",
    ),
    MigrationStep::Execute("CREATE INDEX IF NOT EXISTS idx_todos_priority ON todos (priority)"),
    MigrationStep::Execute(
        "CREATE INDEX IF NOT EXISTS idx_todos_created_at ON todos (created_at)",
    ),
    MigrationStep::Execute(
        "CREATE INDEX IF NOT EXISTS idx_todos_completed_priority ON todos (completed, priority)",
    ),
];

static MIGRATIONS: &[Migration] = &[
    Migration {
        revision: "b2be44556bf2",
        down_revision: None,
        description: "initial todos table",
        postgres: &[MigrationStep::Execute(CREATE_TODOS_POSTGRES)],
        sqlite: &[MigrationStep::Execute(CREATE_TODOS_SQLITE)],
    },
    Migration {
        revision: "add_todo_indexes",
        down_revision: Some("b2be44556bf2"),
        description: "add todo indexes",
        postgres: CREATE_INDEXES,
        sqlite: CREATE_INDEXES,
    },
    Migration {
        revision: "add_payload_column",
        down_revision: Some("add_todo_indexes"),
        description: "add payload column to todos",
        postgres: &[MigrationStep::AddColumnIfMissing {
            table: TODOS_TABLE,
            column: "payload",
            definition: "JSON",
        }],
        sqlite: &[MigrationStep::AddColumnIfMissing {
            table: TODOS_TABLE,
            column: "payload",
            definition: "TEXT",
        }],
    },
];

/// All migrations, oldest first.
pub fn migrations() -> &'static [Migration] {
    MIGRATIONS
}

/// Revision of the newest migration.
pub fn head_revision() -> &'static str {
    MIGRATIONS
        .last()
        .map(|m| m.revision)
        .unwrap_or_default()
}

/// Migrations that still need to run after `current`. `None` means a fresh
/// database.
pub fn pending_after(current: Option<&str>) -> Result<&'static [Migration], MigrationError> {
    let Some(current) = current else {
        return Ok(MIGRATIONS);
    };

    MIGRATIONS
        .iter()
        .position(|m| m.revision == current)
        .map(|index| &MIGRATIONS[index + 1..])
        .ok_or_else(|| MigrationError::UnknownRevision(current.to_string()))
}

/// The newest of the given applied revisions, following chain order.
pub fn current_revision<'a, I>(applied: I) -> Option<&'static str>
where
    I: IntoIterator<Item = &'a str>,
{
    let applied: Vec<&str> = applied.into_iter().collect();
    MIGRATIONS
        .iter()
        .rev()
        .find(|m| applied.contains(&m.revision))
        .map(|m| m.revision)
}

/// DDL for the history table.
pub fn create_history_table_sql(kind: BackendKind) -> &'static str {
    match kind {
        BackendKind::Postgres => {
            "CREATE TABLE IF NOT EXISTS schema_migrations (\
             version VARCHAR(64) PRIMARY KEY, \
             description TEXT NOT NULL, \
             applied_at TIMESTAMPTZ NOT NULL DEFAULT now())"
        }
        BackendKind::Sqlite => {
            "CREATE TABLE IF NOT EXISTS schema_migrations (\
             version TEXT PRIMARY KEY, \
             description TEXT NOT NULL, \
             applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')))"
        }
    }
}

/// `ALTER TABLE ... ADD COLUMN`. PostgreSQL guards it with `IF NOT EXISTS`;
/// SQLite callers must check the column first.
pub fn add_column_sql(kind: BackendKind, table: &str, column: &str, definition: &str) -> String {
    match kind {
        BackendKind::Postgres => {
            format!("ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {column} {definition}")
        }
        BackendKind::Sqlite => format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"),
    }
}

/// Statements that drop every table the migrations create.
pub fn reset_statements() -> [String; 2] {
    [
        format!("DROP TABLE IF EXISTS {TODOS_TABLE}"),
        format!("DROP TABLE IF EXISTS {HISTORY_TABLE}"),
    ]
}
