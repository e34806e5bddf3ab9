//! Database access for the exporter.
//!
//! The exporter only needs two things from a database: the list of tables in
//! the active schema, and all rows of one table. [`TableSource`] captures that
//! contract so the export loop does not depend on a live server.

pub mod mysql;

use crate::Result;
use crate::models::Row;
use async_trait::async_trait;

pub use mysql::MySqlDatabase;

/// A connected database that tables can be exported from.
///
/// Implementations hold exactly one connection and are driven sequentially,
/// hence `&mut self`.
#[async_trait]
pub trait TableSource: Send {
    /// Lists the base tables of the active schema, sorted by name.
    async fn list_tables(&mut self) -> Result<Vec<String>>;

    /// Fetches every row of `table`, keys in column order.
    async fn fetch_rows(&mut self, table: &str) -> Result<Vec<Row>>;
}
