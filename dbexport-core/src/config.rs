//! Database connection configuration.
//!
//! The configuration file is a JSON document with a single `database`
//! section:
//!
//! ```json
//! {
//!   "database": {
//!     "host": "localhost",
//!     "port": 3306,
//!     "user": "wwdtm",
//!     "password": "secret",
//!     "database": "wwdtm"
//!   }
//! }
//! ```
//!
//! Unknown keys are rejected and every connection field is required, so a
//! typo fails the run before any connection attempt is made.
//!
//! # Security
//! The password is kept in a `Zeroizing` container and is omitted from the
//! `Debug` and `Display` output of [`DatabaseConfig`].

use crate::Result;
use crate::error::DbExportError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use zeroize::Zeroizing;

/// Conventional configuration file name, resolved against the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
const MAX_CONNECT_TIMEOUT_SECS: u64 = 300;

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Connection settings for the exported schema
    pub database: DatabaseConfig,
}

/// Connection settings for the MySQL server.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Server host name or address
    pub host: String,
    /// Server TCP port
    pub port: u16,
    /// Account used to connect
    pub user: String,
    /// Account password (never logged)
    password: Zeroizing<String>,
    /// Schema whose tables are exported
    pub database: String,
    /// Seconds to wait for the connection handshake
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"****")
            .field("database", &self.database)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl std::fmt::Display for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl DatabaseConfig {
    /// Creates a configuration from explicit values.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: Zeroizing::new(password.into()),
            database: database.into(),
            connect_timeout_secs: None,
        }
    }

    /// Sets the connection handshake timeout in seconds.
    #[must_use]
    pub const fn with_connect_timeout_secs(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = Some(secs);
        self
    }

    /// The account password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Time allowed for connecting before the attempt is abandoned.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(
            self.connect_timeout_secs
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    /// Checks that every required field is present and non-empty.
    ///
    /// # Errors
    /// Returns a configuration error naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("host", self.host.as_str()),
            ("user", self.user.as_str()),
            ("password", self.password.as_str()),
            ("database", self.database.as_str()),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DbExportError::configuration(format!(
                    "database.{} cannot be empty",
                    field
                )));
            }
        }

        if self.port == 0 {
            return Err(DbExportError::configuration(
                "database.port must be greater than 0",
            ));
        }

        if let Some(secs) = self.connect_timeout_secs
            && !(1..=MAX_CONNECT_TIMEOUT_SECS).contains(&secs)
        {
            return Err(DbExportError::configuration(format!(
                "database.connect_timeout_secs must be between 1 and {}",
                MAX_CONNECT_TIMEOUT_SECS
            )));
        }

        Ok(())
    }
}

impl Config {
    /// Parses and validates a configuration document.
    ///
    /// # Errors
    /// Returns a configuration error if the JSON is malformed, contains
    /// unknown keys, or misses or leaves empty a required field.
    pub fn from_json_str(contents: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(contents)
            .map_err(|e| DbExportError::configuration_with(format!("invalid configuration: {}", e), e))?;
        config.database.validate()?;
        Ok(config)
    }
}

/// Loads the configuration file at `path`.
///
/// # Errors
/// Returns a configuration error if the file is absent or unreadable, or if
/// its contents fail [`Config::from_json_str`].
pub fn load_config(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        DbExportError::configuration_with(
            format!("cannot read configuration file {}: {}", path.display(), e),
            e,
        )
    })?;

    let config = Config::from_json_str(&contents)?;
    tracing::debug!("Loaded configuration for {}", config.database);
    Ok(config)
}
