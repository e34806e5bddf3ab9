//! Error types for the export run.
//!
//! Every failure is fatal to a run, so the variants map one-to-one onto the
//! stages of the export: loading configuration, connecting, querying,
//! preparing the output directory, and writing a table's document.
//!
//! Messages never include the database password. Connection contexts name the
//! target as `user@host:port/database` at most.

use std::path::Path;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for dbexport operations.
#[derive(Debug, Error)]
pub enum DbExportError {
    /// Configuration file missing, unreadable, malformed, or incomplete
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Database connection or handshake failed (credentials sanitized)
    #[error("Database connection failed: {context}")]
    Connection {
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Table listing, metadata lookup, or row fetch failed
    #[error("Query failed: {context}")]
    Query {
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Output directory could not be created or is not writable
    #[error("Output directory error: {context}")]
    Path {
        context: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Serializing or writing one table's document failed
    #[error("Export of table '{table}' failed: {context}")]
    Export {
        table: String,
        context: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The tracing subscriber could not be installed
    #[error("Failed to initialize logging: {message}")]
    Logging { message: String },
}

/// Convenience type alias for Results with `DbExportError`
pub type Result<T> = std::result::Result<T, DbExportError>;

impl DbExportError {
    /// Creates a configuration error without an underlying cause
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a configuration error wrapping the parse or I/O failure
    pub fn configuration_with<E>(message: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates a connection error with sanitized context
    pub fn connection_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: context.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates a connection error that has no driver error behind it (timeouts, failed probes)
    pub fn connection(context: impl Into<String>) -> Self {
        Self::Connection {
            context: context.into(),
            source: None,
        }
    }

    /// Creates a query error with context
    pub fn query_failed<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            context: context.into(),
            source: Some(Box::new(error)),
        }
    }

    /// Creates a parsing error for a column value of a fetched row
    ///
    /// # Arguments
    /// * `column` - Name of the column being decoded
    /// * `table` - Table the row belongs to
    /// * `error` - The underlying decode error
    pub fn decode_column<E>(column: &str, table: &str, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Query {
            context: format!(
                "Failed to decode column '{}' from a row of table '{}'",
                column, table
            ),
            source: Some(Box::new(error)),
        }
    }

    /// Creates an output directory error for `path`
    pub fn path(path: &Path, context: impl Into<String>, error: Option<std::io::Error>) -> Self {
        Self::Path {
            context: format!("{}: {}", path.display(), context.into()),
            source: error,
        }
    }

    /// Creates a per-table export error
    pub fn export(table: impl Into<String>, context: impl Into<String>) -> Self {
        Self::Export {
            table: table.into(),
            context: context.into(),
            source: None,
        }
    }

    /// Creates a per-table export error wrapping a serialization or write failure
    pub fn export_failed<E>(table: impl Into<String>, context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Export {
            table: table.into(),
            context: context.into(),
            source: Some(Box::new(error)),
        }
    }

    /// The message followed by each underlying cause, separated by `: `.
    ///
    /// Causes whose text already appears in the report are skipped, since
    /// several contexts embed their source message.
    pub fn report(&self) -> String {
        let mut report = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !report.contains(&text) {
                report.push_str(": ");
                report.push_str(&text);
            }
            source = cause.source();
        }
        report
    }

    /// Short, stable name of the error category for log fields
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Connection { .. } => "connection",
            Self::Query { .. } => "query",
            Self::Path { .. } => "path",
            Self::Export { .. } => "export",
            Self::Logging { .. } => "logging",
        }
    }
}
