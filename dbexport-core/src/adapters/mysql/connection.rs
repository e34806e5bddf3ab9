//! Connection lifecycle.
//!
//! The exporter holds exactly one connection for the whole run. It is opened
//! here, the session is prepared and probed, and it is closed explicitly by
//! the caller once the run ends, whether the run succeeded or not.

use super::MySqlDatabase;
use crate::Result;
use crate::config::DatabaseConfig;
use crate::error::DbExportError;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};

/// Statements run right after the handshake.
const SESSION_STATEMENTS: &[&str] = &[
    // Consistent timestamps regardless of the server's default zone
    "SET time_zone = '+00:00'",
    "SET SESSION TRANSACTION READ ONLY",
];

/// Builds driver options from the configuration.
pub fn connect_options(config: &DatabaseConfig) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(config.password())
        .database(&config.database)
        .charset("utf8mb4")
}

impl MySqlDatabase {
    /// Opens the connection described by `config`.
    ///
    /// The returned connection has passed a `SELECT 1` probe, so it is usable
    /// for the first query.
    ///
    /// # Errors
    /// Returns a connection error if the configuration is incomplete, the
    /// server is unreachable, authentication fails, the handshake times out,
    /// or the session cannot be prepared.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;

        let target = config.to_string();
        let timeout = config.connect_timeout();
        tracing::info!("Connecting to {}", target);

        let options = connect_options(config);
        let connection = tokio::time::timeout(timeout, MySqlConnection::connect_with(&options))
            .await
            .map_err(|_| {
                DbExportError::connection(format!(
                    "Timed out after {}s connecting to {}",
                    timeout.as_secs(),
                    target
                ))
            })?
            .map_err(|e| DbExportError::connection_failed(format!("Failed to connect to {}", target), e))?;

        let mut database = Self {
            connection,
            schema: config.database.clone(),
            target,
        };

        if let Err(e) = database.prepare_session().await {
            database.close().await;
            return Err(e);
        }

        tracing::debug!("Connection to {} ready", database.target);
        Ok(database)
    }

    async fn prepare_session(&mut self) -> Result<()> {
        for statement in SESSION_STATEMENTS {
            self.connection.execute(*statement).await.map_err(|e| {
                DbExportError::connection_failed(
                    format!("Failed to prepare session ({})", statement),
                    e,
                )
            })?;
        }

        let probe: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&mut self.connection)
            .await
            .map_err(|e| DbExportError::connection_failed("Connectivity probe failed", e))?;

        if probe != 1 {
            return Err(DbExportError::connection(
                "Connectivity probe returned an unexpected result",
            ));
        }

        Ok(())
    }

    /// Releases the connection.
    ///
    /// A failure to say goodbye to the server is logged, not returned: the
    /// run's outcome is already decided by the time this is called.
    pub async fn close(self) {
        let target = self.target;
        match self.connection.close().await {
            Ok(()) => tracing::debug!("Closed connection to {}", target),
            Err(e) => tracing::warn!("Error while closing connection to {}: {}", target, e),
        }
    }
}
