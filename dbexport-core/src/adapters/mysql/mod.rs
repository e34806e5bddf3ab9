//! MySQL table source.
//!
//! # Module Structure
//! - `connection`: Opening, preparing, and closing the single connection
//! - `schema`: Table enumeration and ordering strategy detection
//! - `rows`: Row fetching and conversion to JSON objects
//! - `value`: MySQL column value to JSON value encoding
//!
//! # Guarantees
//! - All statements are read-only (SELECT/SET SESSION only)
//! - The session runs in UTC and in a read-only transaction mode
//! - The password never appears in logs or error messages

pub mod connection;
pub mod rows;
pub mod schema;
pub mod value;

#[cfg(test)]
mod tests;

use super::TableSource;
use crate::Result;
use crate::models::Row;
use async_trait::async_trait;
use sqlx::MySqlConnection;

pub use rows::{quote_identifier, select_all_query};
pub use value::{ValueKind, classify_column, classify_mysql_type};

/// A single open connection to the exported schema.
///
/// Created by [`MySqlDatabase::connect`] and released by
/// [`MySqlDatabase::close`]. Dropping it without closing still closes the
/// socket, but skips the orderly `COM_QUIT`.
pub struct MySqlDatabase {
    connection: MySqlConnection,
    schema: String,
    target: String,
}

impl std::fmt::Debug for MySqlDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlDatabase")
            .field("schema", &self.schema)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl MySqlDatabase {
    /// Name of the schema whose tables are exported.
    pub fn schema(&self) -> &str {
        &self.schema
    }
}

#[async_trait]
impl TableSource for MySqlDatabase {
    async fn list_tables(&mut self) -> Result<Vec<String>> {
        schema::list_tables(&mut self.connection, &self.schema).await
    }

    async fn fetch_rows(&mut self, table: &str) -> Result<Vec<Row>> {
        rows::fetch_rows(&mut self.connection, &self.schema, table).await
    }
}
