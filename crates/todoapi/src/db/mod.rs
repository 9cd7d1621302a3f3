//! Database connection provider.
//!
//! [`Database`] wraps the driver handle for the selected backend. It is built
//! once at startup and shared through `AppState`.

pub mod migrations;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use todoapi_core::database::backend::SQLITE_MEMORY;
use todoapi_core::database::{
    backend_for, detect_backend_kind, BackendKind, DatabaseBackend, DatabaseSettings, PoolConfig,
};
use todoapi_core::storage::TodoRepository;

use crate::storage::{PostgresRepository, SqliteRepository};

/// Wait for a pooled connection when no connect timeout is configured.
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Which parameter set to connect with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    Serve,
    Migrate,
}

/// A live database handle.
#[derive(Clone)]
pub enum Database {
    /// A lazily connecting sqlx pool.
    Postgres(PgPool),
    /// A single SQLite connection running on its own thread.
    Sqlite(tokio_rusqlite::Connection),
}

impl Database {
    /// Connects with the serving pool parameters.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        Self::connect_with(settings, Purpose::Serve).await
    }

    /// Connects with the migration parameters: a smaller pool and a longer
    /// statement timeout.
    pub async fn connect_for_migrations(settings: &DatabaseSettings) -> Result<Self> {
        Self::connect_with(settings, Purpose::Migrate).await
    }

    async fn connect_with(settings: &DatabaseSettings, purpose: Purpose) -> Result<Self> {
        let kind = detect_backend_kind(settings)?;
        let backend = backend_for(kind);
        backend.validate(settings)?;

        let base_dir = std::env::current_dir().context("Failed to read working directory")?;
        ensure_database_exists(backend.as_ref(), settings, &base_dir)?;

        let redacted = backend.redacted_url(settings, &base_dir)?;
        tracing::info!(backend = %kind, url = %redacted, purpose = ?purpose, "Connecting to database");

        match kind {
            BackendKind::Postgres => {
                let url = backend.connection_url(settings, &base_dir)?;
                connect_postgres(&url, backend.as_ref(), purpose)
            }
            BackendKind::Sqlite => {
                let path = backend
                    .database_path(settings, &base_dir)?
                    .context("SQLite database path is not set")?;
                open_sqlite(&path, backend.as_ref()).await
            }
        }
    }

    /// Whether the settings name a SQLite `:memory:` database, which exists
    /// only on the connection that opened it.
    pub fn is_private_memory(settings: &DatabaseSettings) -> bool {
        matches!(detect_backend_kind(settings), Ok(BackendKind::Sqlite))
            && backend_for(BackendKind::Sqlite)
                .database_path(settings, Path::new(""))
                .ok()
                .flatten()
                .is_some_and(|path| path.as_os_str() == SQLITE_MEMORY)
    }

    /// Opens a private in-memory SQLite database.
    pub async fn open_sqlite_in_memory() -> Result<Self> {
        let backend = backend_for(BackendKind::Sqlite);
        open_sqlite(Path::new(SQLITE_MEMORY), backend.as_ref())
            .await
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Database::Postgres(_) => BackendKind::Postgres,
            Database::Sqlite(_) => BackendKind::Sqlite,
        }
    }

    /// A repository sharing this handle.
    pub fn repository(&self) -> Arc<dyn TodoRepository> {
        match self {
            Database::Postgres(pool) => Arc::new(PostgresRepository::new(pool.clone())),
            Database::Sqlite(conn) => Arc::new(SqliteRepository::new(conn.clone())),
        }
    }

    /// Closes the pool or connection.
    pub async fn close(self) {
        match self {
            Database::Postgres(pool) => pool.close().await,
            Database::Sqlite(conn) => {
                if let Err(e) = conn.close().await {
                    tracing::warn!(error = %e, "Failed to close SQLite connection");
                }
            }
        }
        tracing::info!("Database connection closed");
    }
}

/// Creates the parent directory of a SQLite file. No-op for other backends.
pub fn ensure_database_exists(
    backend: &dyn DatabaseBackend,
    settings: &DatabaseSettings,
    base_dir: &Path,
) -> Result<()> {
    let Some(path) = backend.database_path(settings, base_dir)? else {
        return Ok(());
    };
    if path.as_os_str() == SQLITE_MEMORY {
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory {}", parent.display())
            })?;
            tracing::info!(dir = %parent.display(), "Created database directory");
        }
    }
    Ok(())
}

fn connect_postgres(url: &str, backend: &dyn DatabaseBackend, purpose: Purpose) -> Result<Database> {
    let (pool, statement_timeout, connect_timeout) = match purpose {
        Purpose::Serve => {
            let args = backend.connect_args();
            (backend.pool_config(), args.statement_timeout, args.connect_timeout)
        }
        Purpose::Migrate => {
            let settings = backend.migration_settings();
            (settings.pool, settings.statement_timeout, settings.connect_timeout)
        }
    };

    let mut options: PgConnectOptions = url.parse().context("Invalid PostgreSQL URL")?;
    if let Some(timeout) = statement_timeout {
        options = options.options([("statement_timeout", timeout.as_millis().to_string())]);
    }

    let pool = pool_options(&pool, connect_timeout).connect_lazy_with(options);
    Ok(Database::Postgres(pool))
}

/// Maps a [`PoolConfig`] onto sqlx pool options.
fn pool_options(pool: &PoolConfig, connect_timeout: Option<Duration>) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(pool.max_connections())
        .min_connections(0)
        .test_before_acquire(pool.pre_ping)
        .max_lifetime(pool.recycle)
        .acquire_timeout(connect_timeout.unwrap_or(DEFAULT_ACQUIRE_TIMEOUT))
}

async fn open_sqlite(path: &Path, backend: &dyn DatabaseBackend) -> Result<Database> {
    let conn = if path.as_os_str() == SQLITE_MEMORY {
        tokio_rusqlite::Connection::open_in_memory().await
    } else {
        tokio_rusqlite::Connection::open(path).await
    }
    .with_context(|| format!("Failed to open SQLite database {}", path.display()))?;

    let busy_timeout = backend.connect_args().busy_timeout;
    let pragmas = backend.migration_settings().pragmas;

    conn.call(move |conn| {
        if let Some(timeout) = busy_timeout {
            conn.busy_timeout(timeout)
                .map_err(tokio_rusqlite::Error::Rusqlite)?;
        }
        for (name, value) in pragmas {
            if let Err(e) = apply_pragma(conn, name, value) {
                tracing::warn!(pragma = name, value, error = %e, "Failed to apply SQLite pragma");
            }
        }
        Ok(())
    })
    .await
    .context("Failed to configure SQLite connection")?;

    Ok(Database::Sqlite(conn))
}

/// Runs `PRAGMA name = value`, draining any result row it returns.
fn apply_pragma(conn: &rusqlite::Connection, name: &str, value: &str) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(&format!("PRAGMA {name} = {value}"))?;
    let mut rows = stmt.query([])?;
    while rows.next()?.is_some() {}
    Ok(())
}
