//! Table export.
//!
//! A run lists the tables of the connected schema, resolves the output
//! directory, then writes one `<table>.json` document per table, strictly in
//! order. The first failure aborts the run; documents already written are
//! left in place.

use crate::Result;
use crate::adapters::{MySqlDatabase, TableSource};
use crate::config::DatabaseConfig;
use crate::error::DbExportError;
use crate::models::{ExportDocument, ExportSummary, OutputStyle, TableExport};
use crate::output::OutputLocation;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::time::Instant;

/// Which tables of the schema a run exports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSelection {
    /// Export only these tables; empty means all
    pub include: Vec<String>,
    /// Never export these tables
    pub exclude: Vec<String>,
}

impl TableSelection {
    /// Applies the selection to the schema's table list, keeping its order.
    ///
    /// # Errors
    /// Returns a configuration error if an included table does not exist, so
    /// a typo cannot silently produce an incomplete export.
    pub fn apply(&self, tables: Vec<String>) -> Result<Vec<String>> {
        let missing: Vec<&str> = self
            .include
            .iter()
            .filter(|name| !tables.contains(name))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(DbExportError::configuration(format!(
                "requested tables not found in schema: {}",
                missing.join(", ")
            )));
        }

        for name in &self.exclude {
            if !tables.contains(name) {
                tracing::warn!("Excluded table '{}' does not exist", name);
            }
        }

        Ok(tables
            .into_iter()
            .filter(|table| self.include.is_empty() || self.include.contains(table))
            .filter(|table| !self.exclude.contains(table))
            .collect())
    }
}

/// Everything a run needs besides the database.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Base output directory
    pub output_dir: PathBuf,
    /// Nest the output under a timestamp-named subdirectory
    pub use_date_subdir: bool,
    /// Start of the run; names the timestamp subdirectory
    pub started_at: DateTime<Local>,
    /// Document layout
    pub style: OutputStyle,
    /// Tables to export
    pub selection: TableSelection,
}

impl ExportRequest {
    /// A request exporting every table into `output_dir` in compact style.
    pub fn new(output_dir: impl Into<PathBuf>, started_at: DateTime<Local>) -> Self {
        Self {
            output_dir: output_dir.into(),
            use_date_subdir: false,
            started_at,
            style: OutputStyle::default(),
            selection: TableSelection::default(),
        }
    }
}

/// File name of the document for `table`.
///
/// # Errors
/// Returns an export error for names that would not land as a single file
/// inside the output directory.
pub fn table_file_name(table: &str) -> Result<String> {
    let invalid = table.is_empty()
        || table == "."
        || table == ".."
        || table.contains(['/', '\\', '\0']);
    if invalid {
        return Err(DbExportError::export(
            table,
            "table name cannot be used as a file name",
        ));
    }
    Ok(format!("{}.json", table))
}

/// Fetches one table and writes its document, overwriting any previous one.
///
/// # Errors
/// Propagates query errors from `source`; serialization and write failures
/// become export errors for `table`.
pub async fn export_table(
    source: &mut dyn TableSource,
    table: &str,
    location: &OutputLocation,
    style: OutputStyle,
) -> Result<TableExport> {
    let file_name = table_file_name(table)?;

    let rows = source.fetch_rows(table).await?;
    let document = ExportDocument::new(rows);

    let bytes = document
        .to_json_bytes(style)
        .map_err(|e| DbExportError::export_failed(table, "JSON serialization failed", e))?;

    let path = location.file_path(&file_name);
    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        DbExportError::export_failed(table, format!("Failed to write {}", path.display()), e)
    })?;

    tracing::info!(
        "Exported {} ({} rows, {} bytes)",
        table,
        document.len(),
        bytes.len()
    );

    Ok(TableExport {
        table: table.to_string(),
        rows: document.len(),
        bytes: bytes.len(),
        path,
    })
}

/// Exports every selected table of `source`.
///
/// The output directory is created only after the table list was read, so a
/// run that cannot enumerate tables leaves nothing behind.
///
/// # Errors
/// Returns the first error of any step; remaining tables are not exported.
pub async fn export_all(source: &mut dyn TableSource, request: &ExportRequest) -> Result<ExportSummary> {
    let start_time = Instant::now();

    let tables = source.list_tables().await?;
    let tables = request.selection.apply(tables)?;
    tracing::info!("Exporting {} tables", tables.len());

    let location = OutputLocation::resolve(
        &request.output_dir,
        request.use_date_subdir,
        &request.started_at,
    )
    .await?;
    tracing::info!("Output: {}", location.path().display());

    let mut exported = Vec::with_capacity(tables.len());
    for table in &tables {
        let result = export_table(source, table, &location, request.style)
            .await
            .inspect_err(|e| tracing::error!("Export of '{}' failed: {}", table, e))?;
        exported.push(result);
    }

    let summary = ExportSummary {
        location: location.path().to_path_buf(),
        tables: exported,
        duration: start_time.elapsed(),
    };

    tracing::info!(
        "Export completed in {:.2}s - {} tables, {} rows",
        summary.duration.as_secs_f64(),
        summary.tables.len(),
        summary.total_rows()
    );

    Ok(summary)
}

/// Connects with `config`, exports, and closes the connection.
///
/// The connection is closed on every path once it was opened, including
/// when the export fails.
///
/// # Errors
/// Returns the connection error, or the first error of [`export_all`].
pub async fn run_export(config: &DatabaseConfig, request: &ExportRequest) -> Result<ExportSummary> {
    let mut database = MySqlDatabase::connect(config).await?;
    let outcome = export_all(&mut database, request).await;
    database.close().await;
    outcome
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Row;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::path::Path;

    /// In-memory schema standing in for a MySQL connection.
    #[derive(Default)]
    struct FakeSource {
        tables: BTreeMap<String, Vec<Row>>,
        failing_table: Option<String>,
        fail_listing: bool,
        fetched: Vec<String>,
    }

    impl FakeSource {
        fn with_table(mut self, name: &str, rows: Vec<Row>) -> Self {
            self.tables.insert(name.to_string(), rows);
            self
        }
    }

    #[async_trait]
    impl TableSource for FakeSource {
        async fn list_tables(&mut self) -> Result<Vec<String>> {
            if self.fail_listing {
                return Err(DbExportError::query_failed(
                    "Failed to enumerate tables",
                    std::io::Error::other("connection reset"),
                ));
            }
            Ok(self.tables.keys().cloned().collect())
        }

        async fn fetch_rows(&mut self, table: &str) -> Result<Vec<Row>> {
            self.fetched.push(table.to_string());
            if self.failing_table.as_deref() == Some(table) {
                return Err(DbExportError::query_failed(
                    format!("Failed to fetch rows from table '{}'", table),
                    std::io::Error::other("lost connection"),
                ));
            }
            Ok(self.tables.get(table).cloned().unwrap_or_default())
        }
    }

    fn panelist(id: i64, name: &str) -> Row {
        let mut row = Row::new();
        row.insert("id".to_string(), json!(id));
        row.insert("name".to_string(), json!(name));
        row
    }

    fn stats_schema() -> FakeSource {
        FakeSource::default()
            .with_table(
                "panelists",
                vec![panelist(1, "A"), panelist(2, "B"), panelist(3, "C")],
            )
            .with_table("shows", Vec::new())
    }

    fn started_at() -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(2024, 5, 4)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[tokio::test]
    async fn test_export_with_date_subdir() {
        let temp = tempfile::tempdir().unwrap();
        let mut source = stats_schema();
        let mut request = ExportRequest::new(temp.path().join("out"), started_at());
        request.use_date_subdir = true;

        let summary = export_all(&mut source, &request).await.unwrap();

        let expected_dir = temp
            .path()
            .join("out")
            .join("20240504-183000")
            .canonicalize()
            .unwrap();
        assert_eq!(summary.location, expected_dir);
        assert_eq!(
            read(&expected_dir.join("panelists.json")),
            r#"[{"id":1,"name":"A"},{"id":2,"name":"B"},{"id":3,"name":"C"}]"#
        );
        assert_eq!(read(&expected_dir.join("shows.json")), "[]");

        assert_eq!(summary.tables.len(), 2);
        assert_eq!(summary.total_rows(), 3);
        assert_eq!(summary.tables[0].table, "panelists");
        assert_eq!(summary.tables[1].rows, 0);
    }

    #[tokio::test]
    async fn test_rerun_is_byte_identical() {
        let temp = tempfile::tempdir().unwrap();
        let request = ExportRequest::new(temp.path(), started_at());

        export_all(&mut stats_schema(), &request).await.unwrap();
        let first = std::fs::read(temp.path().join("panelists.json")).unwrap();

        export_all(&mut stats_schema(), &request).await.unwrap();
        let second = std::fs::read(temp.path().join("panelists.json")).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_existing_file_is_overwritten() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("shows.json"), "stale contents").unwrap();

        let request = ExportRequest::new(temp.path(), started_at());
        export_all(&mut stats_schema(), &request).await.unwrap();

        assert_eq!(read(&temp.path().join("shows.json")), "[]");
    }

    #[tokio::test]
    async fn test_each_row_has_source_columns_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let mut row = Row::new();
        row.insert("showid".to_string(), json!(1));
        row.insert("showdate".to_string(), json!("1998-01-03"));
        row.insert("bestof".to_string(), json!(0));
        let mut source = FakeSource::default().with_table("ww_shows", vec![row.clone(), row]);

        let request = ExportRequest::new(temp.path(), started_at());
        export_all(&mut source, &request).await.unwrap();

        let document: serde_json::Value =
            serde_json::from_str(&read(&temp.path().join("ww_shows.json"))).unwrap();
        let rows = document.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        for row in rows {
            let keys: Vec<&str> = row.as_object().unwrap().keys().map(String::as_str).collect();
            assert_eq!(keys, ["showid", "showdate", "bestof"]);
        }
    }

    #[tokio::test]
    async fn test_pretty_style() {
        let temp = tempfile::tempdir().unwrap();
        let mut request = ExportRequest::new(temp.path(), started_at());
        request.style = OutputStyle::Pretty;

        export_all(&mut stats_schema(), &request).await.unwrap();

        let text = read(&temp.path().join("panelists.json"));
        assert!(text.starts_with("[\n  {\n    \"id\": 1,"));
        assert!(!text.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_first_failure_aborts_remaining_tables() {
        let temp = tempfile::tempdir().unwrap();
        let mut source = FakeSource::default()
            .with_table("a_first", vec![panelist(1, "A")])
            .with_table("b_broken", vec![panelist(2, "B")])
            .with_table("c_never", vec![panelist(3, "C")]);
        source.failing_table = Some("b_broken".to_string());

        let request = ExportRequest::new(temp.path(), started_at());
        let result = export_all(&mut source, &request).await;

        assert!(matches!(result, Err(DbExportError::Query { .. })));
        assert_eq!(source.fetched, ["a_first", "b_broken"]);
        assert!(temp.path().join("a_first.json").exists());
        assert!(!temp.path().join("b_broken.json").exists());
        assert!(!temp.path().join("c_never.json").exists());
    }

    #[tokio::test]
    async fn test_listing_failure_creates_no_output() {
        let temp = tempfile::tempdir().unwrap();
        let mut source = stats_schema();
        source.fail_listing = true;

        let mut request = ExportRequest::new(temp.path().join("out"), started_at());
        request.use_date_subdir = true;
        let result = export_all(&mut source, &request).await;

        assert!(matches!(result, Err(DbExportError::Query { .. })));
        assert!(!temp.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_selection_limits_exported_tables() {
        let temp = tempfile::tempdir().unwrap();
        let mut request = ExportRequest::new(temp.path(), started_at());
        request.selection.exclude = vec!["shows".to_string()];

        let summary = export_all(&mut stats_schema(), &request).await.unwrap();

        assert_eq!(summary.tables.len(), 1);
        assert!(temp.path().join("panelists.json").exists());
        assert!(!temp.path().join("shows.json").exists());
    }

    #[tokio::test]
    async fn test_unsafe_table_name_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let mut source = FakeSource::default().with_table("../escape", vec![panelist(1, "A")]);

        let request = ExportRequest::new(temp.path().join("out"), started_at());
        let result = export_all(&mut source, &request).await;

        assert!(matches!(result, Err(DbExportError::Export { .. })));
        assert!(!temp.path().join("escape.json").exists());
        assert!(source.fetched.is_empty());
    }

    #[test]
    fn test_table_file_name() {
        assert_eq!(table_file_name("ww_shows").unwrap(), "ww_shows.json");
        assert_eq!(table_file_name("näme with space").unwrap(), "näme with space.json");
        assert!(table_file_name("").is_err());
        assert!(table_file_name("..").is_err());
        assert!(table_file_name("a/b").is_err());
        assert!(table_file_name("a\\b").is_err());
    }

    #[test]
    fn test_selection_include_and_exclude() {
        let tables = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let all = TableSelection::default().apply(tables.clone()).unwrap();
        assert_eq!(all, tables);

        let selection = TableSelection {
            include: vec!["c".to_string(), "a".to_string()],
            exclude: vec!["a".to_string(), "zzz".to_string()],
        };
        assert_eq!(selection.apply(tables.clone()).unwrap(), ["c"]);

        let selection = TableSelection {
            include: vec!["missing".to_string()],
            exclude: Vec::new(),
        };
        assert!(matches!(
            selection.apply(tables),
            Err(DbExportError::Configuration { .. })
        ));
    }
}
