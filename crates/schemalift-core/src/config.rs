//! Configuration (schemalift.toml + environment)
//!
//! Non-secret settings can live in `schemalift.toml`. Environment variables
//! override the file, and built-in defaults fill whatever is left. Credentials
//! are only ever read from the environment.

use crate::identifier::Namespace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

pub const ENV_USER: &str = "SNOWFLAKE_USER";
pub const ENV_PASSWORD: &str = "SNOWFLAKE_PASSWORD";
pub const ENV_ACCOUNT: &str = "SNOWFLAKE_ACCOUNT";
pub const ENV_WAREHOUSE: &str = "SNOWFLAKE_WAREHOUSE";
pub const ENV_ROLE: &str = "SNOWFLAKE_ROLE";
pub const ENV_DEV_DB: &str = "DEV_DB";
pub const ENV_DEV_SCHEMA: &str = "DEV_SCHEMA";
pub const ENV_PROD_DB: &str = "PROD_DB";
pub const ENV_PROD_SCHEMA: &str = "PROD_SCHEMA";
pub const ENV_TABLES_FILE: &str = "TABLES_FILE";
pub const ENV_SNAPSHOT_DIR: &str = "SNAPSHOT_DIR";

pub const DEFAULT_WAREHOUSE: &str = "COMPUTE_WH";
pub const DEFAULT_ROLE: &str = "PUBLIC";
pub const DEFAULT_DEV_DB: &str = "DEV_DB";
pub const DEFAULT_PROD_DB: &str = "PROD_DB";
pub const DEFAULT_SCHEMA: &str = "PUBLIC";
pub const DEFAULT_TABLES_FILE: &str = "tables.csv";
pub const DEFAULT_SNAPSHOT_DIR: &str = "schema_snapshots";

/// Environment variable lookup, injected so resolution never touches the
/// process environment directly
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Look up a variable, treating empty values as unset
fn lookup_non_empty(lookup: EnvLookup<'_>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.trim().is_empty())
}

/// Namespace overrides in the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceSettings {
    #[serde(default)]
    pub database: Option<String>,

    #[serde(default)]
    pub schema: Option<String>,
}

/// Non-secret connection settings in the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    #[serde(default)]
    pub warehouse: Option<String>,

    #[serde(default)]
    pub role: Option<String>,
}

/// Snapshot settings in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSettings {
    /// Capture DEV definitions before migrating
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Root directory for snapshot runs
    #[serde(default)]
    pub root: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            root: None,
        }
    }
}

/// Contents of `schemalift.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// DEV namespace tables are copied from
    #[serde(default)]
    pub source: NamespaceSettings,

    /// PROD namespace tables are created in
    #[serde(default)]
    pub target: NamespaceSettings,

    #[serde(default)]
    pub connection: ConnectionSettings,

    /// Path to the table list
    #[serde(default)]
    pub tables_file: Option<PathBuf>,

    #[serde(default)]
    pub snapshot: SnapshotSettings,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

/// Resolved settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiftConfig {
    pub source: Namespace,
    pub target: Namespace,
    pub tables_file: PathBuf,
    pub snapshot_enabled: bool,
    pub snapshot_root: PathBuf,
}

impl LiftConfig {
    /// Resolve settings: environment first, then the config file, then defaults
    pub fn resolve(config: &Config, lookup: EnvLookup<'_>) -> Self {
        let pick = |env: &str, file: &Option<String>, default: &str| {
            lookup_non_empty(lookup, env)
                .or_else(|| file.clone().filter(|v| !v.trim().is_empty()))
                .unwrap_or_else(|| default.to_string())
        };

        let source = Namespace::new(
            pick(ENV_DEV_DB, &config.source.database, DEFAULT_DEV_DB),
            pick(ENV_DEV_SCHEMA, &config.source.schema, DEFAULT_SCHEMA),
        );
        let target = Namespace::new(
            pick(ENV_PROD_DB, &config.target.database, DEFAULT_PROD_DB),
            pick(ENV_PROD_SCHEMA, &config.target.schema, DEFAULT_SCHEMA),
        );

        let tables_file = lookup_non_empty(lookup, ENV_TABLES_FILE)
            .map(PathBuf::from)
            .or_else(|| config.tables_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TABLES_FILE));

        let snapshot_root = lookup_non_empty(lookup, ENV_SNAPSHOT_DIR)
            .map(PathBuf::from)
            .or_else(|| config.snapshot.root.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SNAPSHOT_DIR));

        Self {
            source,
            target,
            tables_file,
            snapshot_enabled: config.snapshot.enabled,
            snapshot_root,
        }
    }
}

/// Warehouse credentials and session settings
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub user: String,
    pub password: String,
    pub account: String,
    pub warehouse: String,
    pub role: String,
}

impl ConnectionConfig {
    /// Resolve credentials from the environment
    ///
    /// User, password and account are required. Warehouse and role fall back
    /// to the config file and then to built-in defaults.
    pub fn resolve(settings: &ConnectionSettings, lookup: EnvLookup<'_>) -> Result<Self, ConfigError> {
        let need = |name: &str| {
            lookup_non_empty(lookup, name).ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
        };

        let user = need(ENV_USER)?;
        let password = need(ENV_PASSWORD)?;
        let account = need(ENV_ACCOUNT)?;

        let warehouse = lookup_non_empty(lookup, ENV_WAREHOUSE)
            .or_else(|| settings.warehouse.clone())
            .unwrap_or_else(|| DEFAULT_WAREHOUSE.to_string());
        let role = lookup_non_empty(lookup, ENV_ROLE)
            .or_else(|| settings.role.clone())
            .unwrap_or_else(|| DEFAULT_ROLE.to_string());

        Ok(Self {
            user,
            password,
            account,
            warehouse,
            role,
        })
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("account", &self.account)
            .field("warehouse", &self.warehouse)
            .field("role", &self.role)
            .finish()
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing env: {0}")]
    MissingEnv(String),

    #[error("Table list not found: {}", .0.display())]
    TablesFileNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
