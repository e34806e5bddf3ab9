//! Row fetching.

use super::schema::{column_kinds, detect_ordering_strategy};
use super::value::{ValueKind, extract_column_value};
use crate::Result;
use crate::error::DbExportError;
use crate::models::{OrderingStrategy, Row};
use sqlx::mysql::MySqlRow;
use sqlx::{Column, MySqlConnection, Row as _};
use std::collections::HashMap;

/// Quotes a MySQL identifier with backticks, doubling embedded backticks.
///
/// # Example
/// ```rust
/// use dbexport_core::adapters::mysql::quote_identifier;
///
/// assert_eq!(quote_identifier("ww_shows"), "`ww_shows`");
/// assert_eq!(quote_identifier("odd`name"), "`odd``name`");
/// ```
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Generate an ascending ORDER BY clause, or nothing for unordered tables.
pub fn generate_order_by_clause(strategy: &OrderingStrategy) -> Option<String> {
    match strategy {
        OrderingStrategy::PrimaryKey { columns } => {
            let cols: Vec<String> = columns
                .iter()
                .map(|c| format!("{} ASC", quote_identifier(c)))
                .collect();
            Some(format!("ORDER BY {}", cols.join(", ")))
        }
        OrderingStrategy::AutoIncrement { column } => {
            Some(format!("ORDER BY {} ASC", quote_identifier(column)))
        }
        OrderingStrategy::Unordered => None,
    }
}

/// Builds the `SELECT *` statement for one table.
pub fn select_all_query(db_name: &str, table: &str, strategy: &OrderingStrategy) -> String {
    let base = format!(
        "SELECT * FROM {}.{}",
        quote_identifier(db_name),
        quote_identifier(table)
    );
    match generate_order_by_clause(strategy) {
        Some(order_by) => format!("{} {}", base, order_by),
        None => base,
    }
}

/// Fetches every row of `table` as JSON objects.
pub async fn fetch_rows(conn: &mut MySqlConnection, db_name: &str, table: &str) -> Result<Vec<Row>> {
    let strategy = detect_ordering_strategy(conn, db_name, table).await?;
    let kinds = column_kinds(conn, db_name, table).await?;
    let query = select_all_query(db_name, table, &strategy);
    tracing::trace!("Fetching rows: {}", query);

    let rows = sqlx::query(&query)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            DbExportError::query_failed(
                format!("Failed to fetch rows from table '{}.{}'", db_name, table),
                e,
            )
        })?;

    rows.iter().map(|row| row_to_json(row, table, &kinds)).collect()
}

/// Convert a database row to a JSON object keyed by column name.
fn row_to_json(row: &MySqlRow, table: &str, kinds: &HashMap<String, ValueKind>) -> Result<Row> {
    let mut map = Row::new();

    for column in row.columns() {
        let declared = kinds.get(column.name()).copied();
        let value = extract_column_value(row, column.ordinal(), declared)
            .map_err(|e| DbExportError::decode_column(column.name(), table, e))?;
        map.insert(column.name().to_string(), value);
    }

    Ok(map)
}
