//! Database settings as read from a configuration section, with environment
//! overrides and backend detection.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::backend::{available_backends, BackendKind};

/// Environment variables that override individual settings.
pub const ENV_DB_HOST: &str = "DB_HOST";
pub const ENV_DB_PORT: &str = "DB_PORT";
pub const ENV_DB_NAME: &str = "DB_NAME";
pub const ENV_DB_USER: &str = "DB_USER";
pub const ENV_DB_PASSWORD: &str = "DB_PASSWORD";
pub const ENV_DB_SSLMODE: &str = "DB_SSLMODE";
/// Selects the configuration section.
pub const ENV_DB_ENV: &str = "DB_ENV";

/// Errors produced while resolving or validating database settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Unknown database type '{name}'. Available backends: {}", .available.join(", "))]
    UnknownBackend {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("Unsupported database URL scheme in '{0}'")]
    UnsupportedUrl(String),

    #[error("Missing required {backend} settings: {}. Set them in the config section or via {}", .fields.join(", "), .env_vars.join(", "))]
    MissingFields {
        backend: &'static str,
        fields: Vec<&'static str>,
        env_vars: Vec<&'static str>,
    },

    #[error("Invalid port '{0}'")]
    InvalidPort(String),
}

/// Which configuration section to load, chosen by `DB_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbEnvironment {
    Local,
    Sqlite,
    Databricks,
}

impl DbEnvironment {
    /// Parses the `DB_ENV` value. Unknown or missing values select Databricks.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("local") => DbEnvironment::Local,
            Some("sqlite") => DbEnvironment::Sqlite,
            _ => DbEnvironment::Databricks,
        }
    }

    pub fn section_name(self) -> &'static str {
        match self {
            DbEnvironment::Local => "database_local",
            DbEnvironment::Sqlite => "database_sqlite",
            DbEnvironment::Databricks => "database_databricks",
        }
    }
}

/// Connection settings for one database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Explicit backend type, e.g. `postgresql` or `sqlite`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_port",
        skip_serializing_if = "Option::is_none"
    )]
    pub port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// PostgreSQL `sslmode`, e.g. `require`. Unset lets the driver prefer TLS.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sslmode: Option<String>,
}

impl DatabaseSettings {
    /// Settings for a SQLite file or `:memory:`.
    pub fn sqlite(database: impl Into<String>) -> Self {
        Self {
            backend: Some(BackendKind::Sqlite.name().to_string()),
            database: Some(database.into()),
            ..Default::default()
        }
    }

    /// Settings from a single connection URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Applies the `DB_*` environment overrides on top of a config section.
    ///
    /// `env` is a lookup function so callers can pass `std::env::var` or a
    /// fixed map in tests. Empty values count as unset.
    pub fn resolve<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = lookup(ENV_DB_HOST) {
            self.host = Some(host);
        }
        if let Some(port) = lookup(ENV_DB_PORT) {
            self.port = Some(port);
        }
        if let Some(name) = lookup(ENV_DB_NAME) {
            self.database = Some(name);
        }
        if let Some(user) = lookup(ENV_DB_USER) {
            self.user = Some(user);
        }
        if let Some(password) = lookup(ENV_DB_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(sslmode) = lookup(ENV_DB_SSLMODE) {
            self.sslmode = Some(sslmode);
        }

        self
    }

    /// Parsed port, if any.
    pub fn port_number(&self) -> Result<Option<u16>, SettingsError> {
        match non_empty(&self.port) {
            None => Ok(None),
            Some(port) => port
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| SettingsError::InvalidPort(port.to_string())),
        }
    }
}

/// Detects which backend the settings describe.
///
/// Rules, first match wins: explicit `type`, then the URL scheme, then a
/// file-like `database` with no host or port means SQLite, else PostgreSQL.
pub fn detect_backend_kind(settings: &DatabaseSettings) -> Result<BackendKind, SettingsError> {
    if let Some(name) = non_empty(&settings.backend) {
        return name.parse();
    }

    if let Some(url) = non_empty(&settings.url) {
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("sqlite") {
            return Ok(BackendKind::Sqlite);
        }
        if lower.starts_with("postgres") {
            return Ok(BackendKind::Postgres);
        }
        return Err(SettingsError::UnsupportedUrl(url.to_string()));
    }

    let no_server = non_empty(&settings.host).is_none() && non_empty(&settings.port).is_none();
    if let Some(database) = non_empty(&settings.database) {
        let looks_like_file =
            database.ends_with(".db") || database.contains('/') || database.contains('\\');
        if no_server && looks_like_file {
            return Ok(BackendKind::Sqlite);
        }
    }

    Ok(BackendKind::Postgres)
}

impl std::str::FromStr for BackendKind {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(BackendKind::Postgres),
            "sqlite" => Ok(BackendKind::Sqlite),
            _ => Err(SettingsError::UnknownBackend {
                name: s.to_string(),
                available: available_backends(),
            }),
        }
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// YAML configs write ports as numbers or strings; accept both.
fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u64),
        Text(String),
    }

    Ok(match Option::<Port>::deserialize(deserializer)? {
        Some(Port::Number(n)) => Some(n.to_string()),
        Some(Port::Text(s)) if !s.trim().is_empty() => Some(s),
        _ => None,
    })
}
