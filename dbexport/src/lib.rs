//! Command line surface of dbexport.
//!
//! Argument parsing lives here rather than in `main.rs` so the parser and
//! the run can be exercised from tests.

use chrono::{DateTime, Local};
use clap::{Args, Parser};
use dbexport_core::{
    DEFAULT_CONFIG_FILE, ExportRequest, ExportSummary, OutputStyle, Result, TableSelection,
    load_config, run_export,
};
use std::path::PathBuf;

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "dbexport")]
#[command(about = "Export every table of a MySQL schema as JSON files")]
#[command(version)]
#[command(long_about = "
dbexport - MySQL table export

Connects to the database named in the configuration file and writes one
<table>.json file per base table: a JSON array with one object per row,
keyed by column name.

Tables are exported in name order and rows in primary key order, so an
unchanged database produces byte-identical files on every run.

EXAMPLES:
  dbexport                      Export into the current directory
  dbexport backups              Export into ./backups
  dbexport --date /srv/backups  Export into /srv/backups/YYYYMMDD-HHMMSS
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Output directory
    #[arg(
        value_name = "OUTPUT",
        default_value = ".",
        help = "Directory the JSON files are written to (created if missing)"
    )]
    pub output: PathBuf,

    /// Nest output under a timestamp subdirectory
    #[arg(
        long,
        help = "Write into a YYYYMMDD-HHMMSS subdirectory of OUTPUT named after the start time"
    )]
    pub date: bool,

    /// Configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "DBEXPORT_CONFIG",
        default_value = DEFAULT_CONFIG_FILE,
        help = "JSON file holding the database connection settings"
    )]
    pub config: PathBuf,

    /// Indent the JSON output
    #[arg(long, help = "Write indented JSON instead of a single line per file")]
    pub pretty: bool,

    /// Export only these tables
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "LIST",
        help = "Comma-separated list of tables to export"
    )]
    pub tables: Vec<String>,

    /// Skip these tables
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "LIST",
        help = "Comma-separated list of tables to skip"
    )]
    pub exclude: Vec<String>,
}

/// Flags shared by every invocation.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,
}

impl Cli {
    /// Builds the export request for a run started at `started_at`.
    pub fn export_request(&self, started_at: DateTime<Local>) -> ExportRequest {
        ExportRequest {
            output_dir: self.output.clone(),
            use_date_subdir: self.date,
            started_at,
            style: if self.pretty {
                OutputStyle::Pretty
            } else {
                OutputStyle::Compact
            },
            selection: TableSelection {
                include: self.tables.clone(),
                exclude: self.exclude.clone(),
            },
        }
    }
}

/// Loads the configuration and runs the export.
///
/// # Errors
/// Returns the first failure of the run; see [`dbexport_core::DbExportError`].
pub async fn run(cli: &Cli, started_at: DateTime<Local>) -> Result<ExportSummary> {
    let config = load_config(&cli.config)?;
    let request = cli.export_request(started_at);
    run_export(&config.database, &request).await
}

/// One-paragraph report of a finished run.
pub fn format_summary(summary: &ExportSummary) -> String {
    format!(
        "Exported {} tables ({} rows) to {} in {:.2}s",
        summary.tables.len(),
        summary.total_rows(),
        summary.location.display(),
        summary.duration.as_secs_f64()
    )
}
