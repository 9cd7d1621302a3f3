//! Command line and configuration file handling.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use thiserror::Error;

use todoapi_core::database::{DatabaseSettings, DbEnvironment};
use todoapi_core::database::settings::ENV_DB_ENV;

/// Name of the configuration file looked up when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "app.yaml";

/// todoapi - CRUD TODO service with per-request timing
#[derive(Parser, Debug)]
#[command(name = "todoapi")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Host address to bind the server to
    #[arg(long, short = 'H', default_value = "0.0.0.0", env = "HOST", global = true)]
    pub host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "8000", env = "PORT", global = true)]
    pub port: u16,

    /// Path to the YAML configuration file
    #[arg(long, env = "APP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Connection URL; skips the configuration file when set
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Seconds before a request is answered with 408
    #[arg(long, default_value_t = 30, env = "REQUEST_TIMEOUT_SECS", global = true)]
    pub request_timeout: u64,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run migrations, then serve HTTP (default)
    Serve,
    /// Run migrations and exit
    Migrate,
    /// Drop all tables
    ResetDb,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Serve)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Database settings from `--database-url`, or from the configuration file.
    pub fn database_settings(&self) -> Result<DatabaseSettings, ConfigError> {
        if let Some(url) = self.database_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return Ok(DatabaseSettings::from_url(url));
        }
        Ok(AppConfig::load(self.config.as_deref())?.database)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found. Searched: {}", format_paths(.searched))]
    NotFound { searched: Vec<PathBuf> },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("Section '{section}' not found in {}", .path.display())]
    MissingSection { section: String, path: PathBuf },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The resolved database configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub environment: DbEnvironment,
    pub database: DatabaseSettings,
    pub source: PathBuf,
}

impl AppConfig {
    /// Loads the section selected by `DB_ENV` and applies the `DB_*`
    /// overrides from the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => find_config_file()?,
        };

        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let environment = DbEnvironment::from_env_value(std::env::var(ENV_DB_ENV).ok().as_deref());
        let config = Self::parse(&contents, environment, path, |key| std::env::var(key).ok())?;

        tracing::info!(
            path = %config.source.display(),
            section = environment.section_name(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parses YAML text. Only the selected section has to be a valid
    /// [`DatabaseSettings`]; other top-level keys are ignored.
    pub fn parse<F>(
        contents: &str,
        environment: DbEnvironment,
        source: PathBuf,
        env: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_error = |source_err| ConfigError::Parse {
            path: source.clone(),
            source: source_err,
        };

        let document: serde_yaml_ng::Value =
            serde_yaml_ng::from_str(contents).map_err(parse_error)?;

        let section = environment.section_name();
        let value = document
            .get(section)
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| ConfigError::MissingSection {
                section: section.to_string(),
                path: source.clone(),
            })?;

        let settings: DatabaseSettings = serde_yaml_ng::from_value(value).map_err(parse_error)?;

        Ok(Self {
            environment,
            database: settings.resolve(env),
            source,
        })
    }
}

/// Candidate locations for `app.yaml`, in search order.
fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];

    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(dir.join(CONFIG_FILE_NAME));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(CONFIG_FILE_NAME));
    }

    candidates.dedup();
    candidates
}

fn find_config_file() -> Result<PathBuf, ConfigError> {
    let candidates = config_candidates();
    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or(ConfigError::NotFound {
            searched: candidates,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
server:
  name: todoapi
database_local:
  type: postgresql
  host: localhost
  port: 5432
  database: todos
  user: app
database_sqlite:
  type: sqlite
  database: ./data/todos.db
"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_parse_selects_section() {
        let config =
            AppConfig::parse(SAMPLE, DbEnvironment::Sqlite, "app.yaml".into(), no_env).unwrap();
        assert_eq!(config.database, DatabaseSettings::sqlite("./data/todos.db"));
        assert_eq!(config.environment, DbEnvironment::Sqlite);
    }

    #[test]
    fn test_parse_numeric_port() {
        let config =
            AppConfig::parse(SAMPLE, DbEnvironment::Local, "app.yaml".into(), no_env).unwrap();
        assert_eq!(config.database.port.as_deref(), Some("5432"));
        assert_eq!(config.database.host.as_deref(), Some("localhost"));
    }

    #[test]
    fn test_parse_applies_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([("DB_HOST", "db.internal"), ("DB_PASSWORD", "s3cret")]);
        let config = AppConfig::parse(SAMPLE, DbEnvironment::Local, "app.yaml".into(), |key| {
            env.get(key).map(|v| v.to_string())
        })
        .unwrap();
        assert_eq!(config.database.host.as_deref(), Some("db.internal"));
        assert_eq!(config.database.password.as_deref(), Some("s3cret"));
        assert_eq!(config.database.user.as_deref(), Some("app"));
    }

    #[test]
    fn test_parse_missing_section() {
        let err = AppConfig::parse(SAMPLE, DbEnvironment::Databricks, "app.yaml".into(), no_env)
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection { .. }));
        assert!(err.to_string().contains("database_databricks"));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let err = AppConfig::parse("database_sqlite: [", DbEnvironment::Sqlite, "bad.yaml".into(), no_env)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, SAMPLE).unwrap();

        // DB_ENV is unset in the test environment, so the databricks section
        // is selected and missing.
        if std::env::var(ENV_DB_ENV).is_err() {
            let err = AppConfig::load(Some(&path)).unwrap_err();
            assert!(matches!(err, ConfigError::MissingSection { .. }));
        }
    }

    #[test]
    fn test_load_missing_file() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/app.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_not_found_lists_paths() {
        let err = ConfigError::NotFound {
            searched: vec![PathBuf::from("app.yaml"), PathBuf::from("/opt/todoapi/app.yaml")],
        };
        assert_eq!(
            err.to_string(),
            "Configuration file not found. Searched: app.yaml, /opt/todoapi/app.yaml"
        );
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["todoapi"]).unwrap();
        assert_eq!(cli.command(), Command::Serve);
        assert_eq!(cli.request_timeout(), Duration::from_secs(cli.request_timeout));
    }

    #[test]
    fn test_cli_subcommands() {
        let cli = Cli::try_parse_from(["todoapi", "migrate"]).unwrap();
        assert_eq!(cli.command(), Command::Migrate);

        let cli = Cli::try_parse_from(["todoapi", "reset-db"]).unwrap();
        assert_eq!(cli.command(), Command::ResetDb);
    }

    #[test]
    fn test_server_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "todoapi",
            "serve",
            "--port",
            "9000",
            "--host",
            "127.0.0.1",
            "--request-timeout",
            "5",
        ])
        .unwrap();
        assert_eq!(cli.command(), Command::Serve);
        assert_eq!(cli.port, 9000);
        assert_eq!(cli.host, "127.0.0.1");
        assert_eq!(cli.request_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_database_url_skips_config_file() {
        let cli = Cli::try_parse_from([
            "todoapi",
            "--database-url",
            "sqlite:///tmp/todos.db",
            "--config",
            "/nonexistent/app.yaml",
        ])
        .unwrap();
        let settings = cli.database_settings().unwrap();
        assert_eq!(settings.url.as_deref(), Some("sqlite:///tmp/todos.db"));
    }
}
