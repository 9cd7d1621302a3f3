//! Database backend selection and schema definitions.

pub mod backend;
pub mod migrations;
pub mod settings;

pub use backend::{
    available_backends, backend_for, backend_for_name, redact_credentials, BackendKind,
    ConnectArgs, DatabaseBackend, MigrationSettings, PoolConfig, PostgresBackend, SqliteBackend,
};
pub use migrations::{
    head_revision, migrations, pending_after, Migration, MigrationError, MigrationStep,
};
pub use settings::{detect_backend_kind, DatabaseSettings, DbEnvironment, SettingsError};
