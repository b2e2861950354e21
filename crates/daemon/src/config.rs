// Daemon Configuration (environment variables, SQLWATCH_ prefix)

use config::{Config, Environment, Map};
use serde::Deserialize;
use sqlwatch_core::application::DiscoveryPolicy;
use sqlwatch_core::application::worker::constants::{DISCOVERY_MAX_WAIT, DISCOVERY_POLL_INTERVAL};
use sqlwatch_infra_mysql::{MySqlSettings, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const ENV_PREFIX: &str = "SQLWATCH";

/// Prefix of earlier deployments, still accepted; `SQLWATCH_` wins when both are set
pub const LEGACY_ENV_PREFIX: &str = "OOTP";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("Watch path does not exist or is not a directory: {0}")]
    WatchPath(String),

    #[error("Failed to read configuration: {0}")]
    Source(#[from] config::ConfigError),
}

/// Raw values as read from the environment; validated by `DaemonConfig::from_raw`
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    db_host: Option<String>,
    db_port: Option<String>,
    db_user: Option<String>,
    db_password: Option<String>,
    db_name: Option<String>,
    watch_path: Option<String>,
    db_ssl_ca: Option<String>,
    db_ssl_disabled: Option<String>,
    db_connect_timeout_secs: Option<String>,
    poll_interval_secs: Option<String>,
    max_wait_secs: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub db: MySqlSettings,
    pub watch_path: PathBuf,
    pub discovery: DiscoveryPolicy,
}

impl DaemonConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(
            Environment::with_prefix(LEGACY_ENV_PREFIX),
            Environment::with_prefix(ENV_PREFIX),
        )
    }

    /// Load from an explicit variable map (keys include the prefix)
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::load(
            Environment::with_prefix(LEGACY_ENV_PREFIX).source(Some(vars.clone())),
            Environment::with_prefix(ENV_PREFIX).source(Some(vars)),
        )
    }

    // Later sources override earlier ones
    fn load(legacy: Environment, current: Environment) -> Result<Self, ConfigError> {
        let raw: RawConfig = Config::builder()
            .add_source(legacy)
            .add_source(current)
            .build()?
            .try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let host = required(raw.db_host, "db_host", &mut missing);
        let user = required(raw.db_user, "db_user", &mut missing);
        let password = required(raw.db_password, "db_password", &mut missing);
        let database = required(raw.db_name, "db_name", &mut missing);
        let watch_path = required(raw.watch_path, "watch_path", &mut missing);
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let mut db = MySqlSettings::new(host, user, password, database);
        db.port = parse_or("db_port", raw.db_port, DEFAULT_PORT)?;
        db.ssl_ca = non_empty(raw.db_ssl_ca).map(|ca| expand_path(&ca));
        db.ssl_disabled = non_empty(raw.db_ssl_disabled).is_some_and(|v| parse_flag(&v));
        db.connect_timeout = Duration::from_secs(parse_or(
            "db_connect_timeout_secs",
            raw.db_connect_timeout_secs,
            DEFAULT_CONNECT_TIMEOUT.as_secs(),
        )?);

        let discovery = DiscoveryPolicy::new(
            Duration::from_secs(parse_or(
                "poll_interval_secs",
                raw.poll_interval_secs,
                DISCOVERY_POLL_INTERVAL.as_secs(),
            )?),
            Duration::from_secs(parse_or(
                "max_wait_secs",
                raw.max_wait_secs,
                DISCOVERY_MAX_WAIT.as_secs(),
            )?),
        );

        let watch_path = expand_path(&watch_path);
        if !watch_path.is_dir() {
            return Err(ConfigError::WatchPath(watch_path.display().to_string()));
        }

        Ok(Self {
            db,
            watch_path,
            discovery,
        })
    }
}

/// Load a `.env` file into the process environment
///
/// With no explicit path, the working directory and its parents are searched.
/// Variables that are already set are left alone. Returns the file loaded.
pub fn load_dotenv(path: Option<&Path>) -> Option<PathBuf> {
    let result = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };

    match result {
        Ok(loaded) => {
            info!(path = %loaded.display(), "Loaded .env file");
            Some(loaded)
        }
        Err(e) if e.not_found() => {
            debug!("No .env file found, using process environment only");
            None
        }
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable .env file");
            None
        }
    }
}

fn env_name(key: &str) -> String {
    format!("{}_{}", ENV_PREFIX, key.to_uppercase())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, key: &str, missing: &mut Vec<String>) -> String {
    match non_empty(value) {
        Some(v) => v,
        None => {
            missing.push(env_name(key));
            String::new()
        }
    }
}

fn parse_or<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(value) {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key: env_name(key),
            message: format!("{:?}: {}", v, e),
        }),
    }
}

/// `true`, `1` and `yes` (any case) enable a flag; anything else disables it
fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn expand_path(value: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(value).into_owned())
}
