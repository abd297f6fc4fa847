//! MySQL dialect driver (MySQL and MariaDB).
//!
//! # Module Structure
//! - `connection`: URL normalization and lazy pool creation
//! - `schema`: `SHOW TABLES`, `SHOW CREATE TABLE` and `INFORMATION_SCHEMA` columns
//! - `rows`: Row counting and batched fetching through text casts
//!
//! # Security Guarantees
//! - Dump queries are SELECT/SHOW only
//! - The connection URL is never logged; restores pass the password through
//!   `MYSQL_PWD`

pub mod connection;
pub mod rows;
pub mod schema;

#[cfg(test)]
mod tests;

use super::restore::{RestoreCommand, RestoreTarget, mysql_command};
use super::{Dialect, DialectDriver};
use crate::Result;
use crate::models::{ColumnInfo, DriverKind, Row};
use async_trait::async_trait;
use sqlx::MySqlPool;
use std::path::Path;

/// MySQL driver bound to one database.
pub struct MySqlDriver {
    /// Connection pool for database operations
    pub pool: MySqlPool,
    /// Connection name
    name: String,
    /// Connection URL, kept private to prevent credential exposure
    connection_url: String,
}

impl std::fmt::Debug for MySqlDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlDriver")
            .field("name", &self.name)
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DialectDriver for MySqlDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::MySql
    }

    fn connection_name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn list_tables(&self, exclude: &[String]) -> Result<Vec<String>> {
        schema::list_tables(&self.pool, exclude).await
    }

    async fn table_definition(&self, table: &str) -> Result<String> {
        schema::table_definition(&self.pool, table).await
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        schema::columns(&self.pool, table).await
    }

    async fn count_rows(&self, table: &str) -> Result<u64> {
        rows::count_rows(&self.pool, table).await
    }

    async fn fetch_rows(
        &self,
        table: &str,
        columns: &[ColumnInfo],
        offset: u64,
        limit: usize,
    ) -> Result<Vec<Row>> {
        rows::fetch_rows(&self.pool, table, columns, offset, limit).await
    }

    fn restore_command(&self, input: &Path) -> Result<RestoreCommand> {
        let target = RestoreTarget::from_url(&self.connection_url)?;
        Ok(mysql_command(&target, input))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
