//! Core library for dbexport.
//!
//! dbexport writes every base table of one MySQL schema to its own JSON file,
//! an array of row objects keyed by column name. This crate holds everything
//! except argument parsing: configuration loading, the MySQL connection, value
//! encoding, output directory resolution, and the export loop.
//!
//! # Guarantees
//! - All database operations are read-only
//! - The database password is never logged or included in errors
//! - Tables are exported in name order, rows in primary key order where one
//!   exists, so unchanged data produces byte-identical files
//!
//! # Example
//! ```rust,no_run
//! use dbexport_core::{ExportRequest, load_config, run_export};
//! use std::path::Path;
//!
//! # async fn example() -> dbexport_core::Result<()> {
//! let config = load_config(Path::new("config.json"))?;
//! let request = ExportRequest::new("backup", chrono::Local::now());
//! let summary = run_export(&config.database, &request).await?;
//! println!("{} tables written to {}", summary.tables.len(), summary.location.display());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod output;

// Re-export commonly used types
pub use adapters::{MySqlDatabase, TableSource};
pub use config::{Config, DEFAULT_CONFIG_FILE, DatabaseConfig, load_config};
pub use error::{DbExportError, Result};
pub use export::{ExportRequest, TableSelection, export_all, export_table, run_export, table_file_name};
pub use logging::init_logging;
pub use models::{ExportDocument, ExportSummary, OrderingStrategy, OutputStyle, Row, TableExport};
pub use output::{DATE_SUBDIR_FORMAT, OutputLocation, date_subdir_name};
