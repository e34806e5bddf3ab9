//! Data structures passed between the database layer and the exporter.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// One table row: column name to JSON value, in source column order.
///
/// `serde_json` is built with `preserve_order`, so insertion order is kept
/// when the row is serialized.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// How rows are ordered when a table is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderingStrategy {
    /// Order by the primary key columns, in key position order
    PrimaryKey { columns: Vec<String> },
    /// Order by the table's auto-increment column
    AutoIncrement { column: String },
    /// No reliable ordering column; rows come back in server order
    Unordered,
}

/// Layout of the JSON written for each table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputStyle {
    /// Single line, no whitespace between tokens
    #[default]
    Compact,
    /// Two-space indentation
    Pretty,
}

/// The rows of one table, ready to be serialized as a JSON array.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ExportDocument {
    rows: Vec<Row>,
}

impl ExportDocument {
    /// Wraps fetched rows.
    pub const fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows in the document.
    pub const fn len(&self) -> usize {
        self.rows.len()
    }

    /// True for an empty table.
    pub const fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serializes the document in the requested style.
    ///
    /// No trailing newline is added.
    ///
    /// # Errors
    /// Returns the serializer's error; with JSON values built from fetched
    /// rows this only happens on allocation failure.
    pub fn to_json_bytes(&self, style: OutputStyle) -> serde_json::Result<Vec<u8>> {
        match style {
            OutputStyle::Compact => serde_json::to_vec(self),
            OutputStyle::Pretty => serde_json::to_vec_pretty(self),
        }
    }
}

/// Result of exporting one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableExport {
    /// Table name
    pub table: String,
    /// Number of rows written
    pub rows: usize,
    /// Size of the written document in bytes
    pub bytes: usize,
    /// File the document was written to
    pub path: PathBuf,
}

/// Result of a complete run.
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Directory all documents were written to
    pub location: PathBuf,
    /// Per-table results in export order
    pub tables: Vec<TableExport>,
    /// Wall time from listing tables to the last write
    pub duration: Duration,
}

impl ExportSummary {
    /// Total rows across all exported tables.
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}
