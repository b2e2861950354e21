// MySQL Connection Setup

use crate::error::describe_sqlx_error;
use sqlwatch_core::port::GatewayError;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlSslMode};
use sqlx::Connection;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Default MySQL port
pub const DEFAULT_PORT: u16 = 3306;

/// Default bound on a single connection attempt (30s)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection settings for the execution gateway
#[derive(Clone)]
pub struct MySqlSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// CA certificate; when set the server certificate is verified against it
    pub ssl_ca: Option<PathBuf>,
    pub ssl_disabled: bool,
    pub connect_timeout: Duration,
}

impl MySqlSettings {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            password: password.into(),
            database: database.into(),
            ssl_ca: None,
            ssl_disabled: false,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Build driver options
    ///
    /// TLS: disabled flag wins; a CA path verifies the server certificate;
    /// otherwise TLS is required without certificate verification.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database);

        if self.ssl_disabled {
            options.ssl_mode(MySqlSslMode::Disabled)
        } else if let Some(ca) = &self.ssl_ca {
            options.ssl_mode(MySqlSslMode::VerifyCa).ssl_ca(ca)
        } else {
            options.ssl_mode(MySqlSslMode::Required)
        }
    }

    /// `host:port/database` for log lines
    pub fn target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

impl fmt::Debug for MySqlSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("ssl_ca", &self.ssl_ca)
            .field("ssl_disabled", &self.ssl_disabled)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Open a single MySQL connection, bounded by the connect timeout
pub async fn open_connection(settings: &MySqlSettings) -> Result<MySqlConnection, GatewayError> {
    let options = settings.connect_options();

    let conn = tokio::time::timeout(
        settings.connect_timeout,
        MySqlConnection::connect_with(&options),
    )
    .await
    .map_err(|_| {
        GatewayError::Connection(format!(
            "{}: timed out after {}s",
            settings.target(),
            settings.connect_timeout.as_secs()
        ))
    })?
    .map_err(|e| {
        GatewayError::Connection(format!("{}: {}", settings.target(), describe_sqlx_error(&e)))
    })?;

    info!(target_db = %settings.target(), "Connected to database");
    Ok(conn)
}
