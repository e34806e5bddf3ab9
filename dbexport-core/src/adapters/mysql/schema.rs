//! Table enumeration and ordering strategy detection.
//!
//! Metadata comes from `INFORMATION_SCHEMA`. Name columns are cast to CHAR to
//! avoid VARBINARY results on MySQL 8.0+.

use super::value::{ValueKind, classify_column};
use crate::Result;
use crate::error::DbExportError;
use crate::models::OrderingStrategy;
use sqlx::{MySqlConnection, Row};
use std::collections::HashMap;

/// Lists the base tables of `db_name`, sorted by name.
///
/// Views are skipped: they have no storage of their own to back up.
pub async fn list_tables(conn: &mut MySqlConnection, db_name: &str) -> Result<Vec<String>> {
    let tables_query = r#"
        SELECT CAST(TABLE_NAME AS CHAR) as TABLE_NAME
        FROM INFORMATION_SCHEMA.TABLES
        WHERE TABLE_SCHEMA = ?
        AND TABLE_TYPE = 'BASE TABLE'
        ORDER BY TABLE_NAME
    "#;

    let rows = sqlx::query(tables_query)
        .bind(db_name)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            DbExportError::query_failed(format!("Failed to enumerate tables of '{}'", db_name), e)
        })?;

    let mut tables = rows
        .iter()
        .map(|row| {
            row.try_get::<String, _>("TABLE_NAME")
                .map_err(|e| DbExportError::decode_column("TABLE_NAME", "INFORMATION_SCHEMA.TABLES", e))
        })
        .collect::<Result<Vec<_>>>()?;

    // Collation order on the server may ignore case; output order must not
    tables.sort();

    tracing::debug!("Found {} tables in '{}'", tables.len(), db_name);
    Ok(tables)
}

/// Declared encoding family of every column of `table`, keyed by column name.
pub async fn column_kinds(
    conn: &mut MySqlConnection,
    db_name: &str,
    table: &str,
) -> Result<HashMap<String, ValueKind>> {
    let columns_query = r#"
        SELECT
            CAST(COLUMN_NAME AS CHAR) as COLUMN_NAME,
            CAST(DATA_TYPE AS CHAR) as DATA_TYPE,
            CAST(COLUMN_TYPE AS CHAR) as COLUMN_TYPE
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = ?
        AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION
    "#;

    let rows = sqlx::query(columns_query)
        .bind(db_name)
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            DbExportError::query_failed(
                format!("Failed to read column types of table '{}.{}'", db_name, table),
                e,
            )
        })?;

    rows.iter()
        .map(|row| -> Result<(String, ValueKind)> {
            let name: String = row
                .try_get("COLUMN_NAME")
                .map_err(|e| DbExportError::decode_column("COLUMN_NAME", table, e))?;
            let data_type: String = row
                .try_get("DATA_TYPE")
                .map_err(|e| DbExportError::decode_column("DATA_TYPE", table, e))?;
            let column_type: String = row
                .try_get("COLUMN_TYPE")
                .map_err(|e| DbExportError::decode_column("COLUMN_TYPE", table, e))?;
            Ok((name, classify_column(&data_type, &column_type)))
        })
        .collect()
}

/// Detect the ordering strategy used when fetching `table`.
///
/// The detection priority is:
/// 1. Primary key columns
/// 2. Auto-increment column
/// 3. Unordered (server order)
pub async fn detect_ordering_strategy(
    conn: &mut MySqlConnection,
    db_name: &str,
    table: &str,
) -> Result<OrderingStrategy> {
    if let Some(pk_strategy) = detect_primary_key(conn, db_name, table).await? {
        tracing::trace!(
            "Ordering {}.{} by primary key: {:?}",
            db_name,
            table,
            pk_strategy
        );
        return Ok(pk_strategy);
    }

    if let Some(auto_strategy) = detect_auto_increment_column(conn, db_name, table).await? {
        tracing::trace!(
            "Ordering {}.{} by auto-increment column: {:?}",
            db_name,
            table,
            auto_strategy
        );
        return Ok(auto_strategy);
    }

    tracing::warn!(
        "Table {}.{} has no primary key or auto-increment column, rows are exported in server order",
        db_name,
        table
    );
    Ok(OrderingStrategy::Unordered)
}

async fn detect_primary_key(
    conn: &mut MySqlConnection,
    db_name: &str,
    table: &str,
) -> Result<Option<OrderingStrategy>> {
    let pk_query = r#"
        SELECT CAST(COLUMN_NAME AS CHAR) as COLUMN_NAME
        FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
        WHERE TABLE_SCHEMA = ?
        AND TABLE_NAME = ?
        AND CONSTRAINT_NAME = 'PRIMARY'
        ORDER BY ORDINAL_POSITION
    "#;

    let rows = sqlx::query(pk_query)
        .bind(db_name)
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| {
            DbExportError::query_failed(
                format!("Failed to detect primary key for table '{}.{}'", db_name, table),
                e,
            )
        })?;

    if rows.is_empty() {
        return Ok(None);
    }

    let columns = rows
        .iter()
        .map(|row| {
            row.try_get::<String, _>("COLUMN_NAME")
                .map_err(|e| DbExportError::decode_column("COLUMN_NAME", table, e))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(OrderingStrategy::PrimaryKey { columns }))
}

async fn detect_auto_increment_column(
    conn: &mut MySqlConnection,
    db_name: &str,
    table: &str,
) -> Result<Option<OrderingStrategy>> {
    let auto_query = r#"
        SELECT CAST(COLUMN_NAME AS CHAR) as COLUMN_NAME
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = ?
        AND TABLE_NAME = ?
        AND EXTRA LIKE '%auto_increment%'
        ORDER BY ORDINAL_POSITION
        LIMIT 1
    "#;

    let row = sqlx::query(auto_query)
        .bind(db_name)
        .bind(table)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| {
            DbExportError::query_failed(
                format!(
                    "Failed to detect auto-increment column for table '{}.{}'",
                    db_name, table
                ),
                e,
            )
        })?;

    match row {
        Some(row) => {
            let column: String = row
                .try_get("COLUMN_NAME")
                .map_err(|e| DbExportError::decode_column("COLUMN_NAME", table, e))?;
            Ok(Some(OrderingStrategy::AutoIncrement { column }))
        }
        None => Ok(None),
    }
}
