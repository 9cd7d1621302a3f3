//! Migration runner.
//!
//! Applies the pending migrations from `todoapi_core::database::migrations`
//! and records each revision in the history table. Every migration runs in
//! its own transaction.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;

use todoapi_core::database::migrations::{
    add_column_sql, create_history_table_sql, current_revision, head_revision, pending_after,
    reset_statements, Migration, MigrationStep,
};
use todoapi_core::database::{backend_for, BackendKind, DatabaseSettings, MigrationSettings};

use super::Database;
use crate::storage::{postgres, sqlite};

/// `applied_at` format for SQLite, matching the column default.
const APPLIED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Outcome of a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Revisions applied by this run, in order.
    pub applied: Vec<String>,
    /// Number of migrations that were already applied.
    pub skipped: usize,
    /// Revision before this run.
    pub current: Option<String>,
    pub head: String,
}

/// Brings the schema up to the head revision.
pub async fn run_migrations(db: &Database) -> Result<MigrationReport> {
    let kind = db.kind();
    let settings = backend_for(kind).migration_settings();
    let head = head_revision();

    tracing::info!(backend = %kind, batch_mode = settings.batch_mode, "Running database migrations");

    ping(db)
        .await
        .context("Database connectivity check failed before migrations")?;
    tracing::debug!("Database connection OK");

    create_history_table(db).await?;

    let applied = applied_revisions(db).await?;
    let current = current_revision(applied.iter().map(String::as_str));
    tracing::info!(current = ?current, head, "Read schema revision");

    if current == Some(head) {
        tracing::info!(revision = head, "Database schema is up to date");
        return Ok(MigrationReport {
            applied: Vec::new(),
            skipped: todoapi_core::database::migrations().len(),
            current: current.map(str::to_string),
            head: head.to_string(),
        });
    }

    let pending = pending_after(current)?;
    let skipped = todoapi_core::database::migrations().len() - pending.len();

    let mut report = MigrationReport {
        applied: Vec::with_capacity(pending.len()),
        skipped,
        current: current.map(str::to_string),
        head: head.to_string(),
    };

    for migration in pending {
        tracing::info!(
            revision = migration.revision,
            description = migration.description,
            "Applying migration"
        );
        apply(db, *migration, &settings)
            .await
            .with_context(|| format!("Migration {} failed", migration.revision))?;
        report.applied.push(migration.revision.to_string());
    }

    tracing::info!(
        applied = report.applied.len(),
        skipped = report.skipped,
        head,
        "Migrations complete"
    );
    Ok(report)
}

/// Runs migrations on a dedicated migration connection and closes it before
/// returning, so the serving pool never carries migration settings.
pub async fn migrate(settings: &DatabaseSettings) -> Result<MigrationReport> {
    let db = Database::connect_for_migrations(settings).await?;
    let report = run_migrations(&db).await;
    db.close().await;
    report
}

/// Migrates, then opens the serving connection. A `:memory:` database is
/// migrated on the serving connection itself.
pub async fn connect_migrated(settings: &DatabaseSettings) -> Result<(Database, MigrationReport)> {
    if Database::is_private_memory(settings) {
        let db = Database::connect(settings).await?;
        let report = run_migrations(&db).await?;
        return Ok((db, report));
    }
    let report = migrate(settings).await?;
    Ok((Database::connect(settings).await?, report))
}

/// Drops the TODO and history tables.
pub async fn reset_database(db: &Database) -> Result<()> {
    let statements = reset_statements();
    match db {
        Database::Postgres(pool) => {
            for sql in &statements {
                sqlx::raw_sql(sql)
                    .execute(pool)
                    .await
                    .with_context(|| format!("Failed to run: {sql}"))?;
            }
        }
        Database::Sqlite(conn) => {
            conn.call(move |conn| {
                for sql in &statements {
                    conn.execute_batch(sql)
                        .map_err(tokio_rusqlite::Error::Rusqlite)?;
                }
                Ok(())
            })
            .await
            .context("Failed to reset SQLite database")?;
        }
    }
    tracing::warn!(backend = %db.kind(), "Database reset: all tables dropped");
    Ok(())
}

async fn ping(db: &Database) -> Result<()> {
    match db {
        Database::Postgres(pool) => {
            sqlx::query_scalar::<_, i64>(postgres::schema::SELECT_ONE)
                .fetch_one(pool)
                .await?;
        }
        Database::Sqlite(conn) => {
            conn.call(|conn| {
                conn.query_row(sqlite::schema::SELECT_ONE, [], |row| row.get::<_, i64>(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?;
        }
    }
    Ok(())
}

async fn create_history_table(db: &Database) -> Result<()> {
    let sql = create_history_table_sql(db.kind());
    match db {
        Database::Postgres(pool) => {
            sqlx::raw_sql(sql).execute(pool).await?;
        }
        Database::Sqlite(conn) => {
            conn.call(move |conn| {
                conn.execute_batch(sql)
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?;
        }
    }
    Ok(())
}

async fn applied_revisions(db: &Database) -> Result<Vec<String>> {
    let revisions = match db {
        Database::Postgres(pool) => {
            sqlx::query_scalar::<_, String>(postgres::schema::SELECT_APPLIED_REVISIONS)
                .fetch_all(pool)
                .await?
        }
        Database::Sqlite(conn) => {
            conn.call(|conn| {
                let mut stmt = conn
                    .prepare(sqlite::schema::SELECT_APPLIED_REVISIONS)
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                let rows = stmt
                    .query_map([], |row| row.get::<_, String>(0))
                    .map_err(tokio_rusqlite::Error::Rusqlite)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?
        }
    };
    Ok(revisions)
}

async fn apply(db: &Database, migration: Migration, settings: &MigrationSettings) -> Result<()> {
    match db {
        Database::Postgres(pool) => apply_postgres(pool, migration, settings).await,
        Database::Sqlite(conn) => {
            let guard_columns = settings.batch_mode;
            conn.call(move |conn| {
                apply_sqlite(conn, migration, guard_columns)
                    .map_err(tokio_rusqlite::Error::Rusqlite)
            })
            .await?;
            Ok(())
        }
    }
}

async fn apply_postgres(
    pool: &PgPool,
    migration: Migration,
    settings: &MigrationSettings,
) -> Result<()> {
    let mut tx = pool.begin().await?;

    if let Some(timeout) = settings.statement_timeout {
        let sql = format!("SET LOCAL statement_timeout = {}", timeout.as_millis());
        sqlx::raw_sql(&sql).execute(&mut *tx).await?;
    }

    for step in migration.steps(BackendKind::Postgres) {
        match *step {
            MigrationStep::Execute(sql) => {
                sqlx::raw_sql(sql).execute(&mut *tx).await?;
            }
            MigrationStep::AddColumnIfMissing {
                table,
                column,
                definition,
            } => {
                let sql = add_column_sql(BackendKind::Postgres, table, column, definition);
                sqlx::raw_sql(&sql).execute(&mut *tx).await?;
            }
        }
    }

    sqlx::query(postgres::schema::INSERT_APPLIED_REVISION)
        .bind(migration.revision)
        .bind(migration.description)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// SQLite has no `ADD COLUMN IF NOT EXISTS`; with `guard_columns` set, column
/// additions are skipped when the column is already present.
fn apply_sqlite(
    conn: &mut rusqlite::Connection,
    migration: Migration,
    guard_columns: bool,
) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;

    for step in migration.steps(BackendKind::Sqlite) {
        match *step {
            MigrationStep::Execute(sql) => tx.execute_batch(sql)?,
            MigrationStep::AddColumnIfMissing {
                table,
                column,
                definition,
            } => {
                let exists = guard_columns
                    && tx.query_row(sqlite::schema::COLUMN_EXISTS, [table, column], |row| {
                        row.get::<_, i64>(0)
                    })? > 0;
                if exists {
                    tracing::info!(table, column, "Column already exists, skipping");
                } else {
                    tx.execute_batch(&add_column_sql(BackendKind::Sqlite, table, column, definition))?;
                }
            }
        }
    }

    tx.execute(
        sqlite::schema::INSERT_APPLIED_REVISION,
        rusqlite::params![
            migration.revision,
            migration.description,
            Utc::now().format(APPLIED_AT_FORMAT).to_string()
        ],
    )?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_columns(db: &Database, table: &'static str) -> Vec<String> {
        let Database::Sqlite(conn) = db else {
            panic!("expected SQLite");
        };
        conn.call(move |conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM pragma_table_info(?1)")
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
            let rows = stmt
                .query_map([table], |row| row.get::<_, String>(0))
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .unwrap()
    }

    async fn index_names(db: &Database) -> Vec<String> {
        let Database::Sqlite(conn) = db else {
            panic!("expected SQLite");
        };
        conn.call(|conn| {
            let mut stmt = conn
                .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'todos'")
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
            let rows = stmt
                .query_map([], |row| row.get::<_, String>(0))
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_fresh_database_applies_all() {
        let db = Database::open_sqlite_in_memory().await.unwrap();

        let report = run_migrations(&db).await.unwrap();
        assert_eq!(
            report.applied,
            vec!["b2be44556bf2", "add_todo_indexes", "add_payload_column"]
        );
        assert_eq!(report.skipped, 0);
        assert_eq!(report.current, None);
        assert_eq!(report.head, "add_payload_column");

        let columns = table_columns(&db, "todos").await;
        for expected in [
            "id",
            "title",
            "description",
            "completed",
            "priority",
            "due_date",
            "payload",
            "created_at",
            "updated_at",
        ] {
            assert!(columns.iter().any(|c| c == expected), "missing {expected}");
        }

        let indexes = index_names(&db).await;
        for expected in [
            "idx_todos_completed",
            "idx_todos_priority",
            "idx_todos_created_at",
            "idx_todos_completed_priority",
        ] {
            assert!(indexes.iter().any(|i| i == expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn test_second_run_is_noop() {
        let db = Database::open_sqlite_in_memory().await.unwrap();
        run_migrations(&db).await.unwrap();

        let report = run_migrations(&db).await.unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.skipped, 3);
        assert_eq!(report.current.as_deref(), Some("add_payload_column"));
    }

    #[tokio::test]
    async fn test_resumes_from_partial_history() {
        let db = Database::open_sqlite_in_memory().await.unwrap();
        let Database::Sqlite(conn) = &db else {
            panic!("expected SQLite");
        };

        // Simulate a database created before the payload column existed,
        // but where the column was added by hand.
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE todos (id INTEGER PRIMARY KEY AUTOINCREMENT, title VARCHAR(255) NOT NULL, \
                 description TEXT, completed BOOLEAN NOT NULL DEFAULT 0, priority INTEGER NOT NULL DEFAULT 2, \
                 due_date TEXT, created_at TEXT NOT NULL, updated_at TEXT NOT NULL, payload TEXT);
                 CREATE TABLE schema_migrations (version TEXT PRIMARY KEY, description TEXT NOT NULL, applied_at TEXT NOT NULL);
                 INSERT INTO schema_migrations VALUES ('b2be44556bf2', 'initial todos table', '2025-01-01T00:00:00Z');
                 INSERT INTO schema_migrations VALUES ('add_todo_indexes', 'add todo indexes', '2025-01-01T00:00:00Z');",
            )
            .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .unwrap();

        let report = run_migrations(&db).await.unwrap();
        assert_eq!(report.applied, vec!["add_payload_column"]);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.current.as_deref(), Some("add_todo_indexes"));
    }

    #[tokio::test]
    async fn test_unrecognized_history_rows_are_ignored() {
        let db = Database::open_sqlite_in_memory().await.unwrap();
        let Database::Sqlite(conn) = &db else {
            panic!("expected SQLite");
        };
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE schema_migrations (version TEXT PRIMARY KEY, description TEXT NOT NULL, applied_at TEXT NOT NULL);
                 INSERT INTO schema_migrations VALUES ('from_the_future', 'unknown', '2030-01-01T00:00:00Z');",
            )
            .map_err(tokio_rusqlite::Error::Rusqlite)
        })
        .await
        .unwrap();

        // No known revision is applied, so everything is pending and the
        // unknown row is ignored.
        let report = run_migrations(&db).await.unwrap();
        assert_eq!(report.applied.len(), 3);
    }

    #[tokio::test]
    async fn test_migrate_prepares_file_database_for_serving() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DatabaseSettings::sqlite(dir.path().join("todos.db").to_string_lossy());

        let report = migrate(&settings).await.unwrap();
        assert_eq!(report.applied.len(), 3);

        // The serving connection sees the schema the migration handle left behind.
        let db = Database::connect(&settings).await.unwrap();
        assert!(table_columns(&db, "todos").await.iter().any(|c| c == "payload"));
        let report = run_migrations(&db).await.unwrap();
        assert!(report.applied.is_empty());
        db.close().await;

        let report = migrate(&settings).await.unwrap();
        assert_eq!(report.skipped, 3);
    }

    #[tokio::test]
    async fn test_connect_migrated_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let settings = DatabaseSettings::sqlite(dir.path().join("todos.db").to_string_lossy());

        let (db, report) = connect_migrated(&settings).await.unwrap();
        assert_eq!(report.applied.len(), 3);
        assert!(table_columns(&db, "todos").await.iter().any(|c| c == "due_date"));
        db.close().await;
    }

    #[tokio::test]
    async fn test_connect_migrated_memory_database() {
        let settings = DatabaseSettings::sqlite(":memory:");
        assert!(Database::is_private_memory(&settings));

        let (db, report) = connect_migrated(&settings).await.unwrap();
        assert_eq!(report.applied.len(), 3);
        assert!(table_columns(&db, "todos").await.iter().any(|c| c == "payload"));
    }

    #[tokio::test]
    async fn test_reset_drops_tables() {
        let db = Database::open_sqlite_in_memory().await.unwrap();
        run_migrations(&db).await.unwrap();

        reset_database(&db).await.unwrap();
        assert!(table_columns(&db, "todos").await.is_empty());
        assert!(table_columns(&db, "schema_migrations").await.is_empty());

        let report = run_migrations(&db).await.unwrap();
        assert_eq!(report.applied.len(), 3);
    }
}
