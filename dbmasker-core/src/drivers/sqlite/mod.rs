//! SQLite dialect driver.
//!
//! # Module Structure
//! - `connection`: Connection string handling and lazy pool creation
//! - `schema`: Table enumeration, DDL and column introspection via `sqlite_master`
//! - `rows`: Row counting and batched fetching
//!
//! # SQLite-Specific Behavior
//! - Dumps open the database read-only
//! - Restores back up the existing file to `<file>.backup` and truncate it
//! - In-memory databases cannot be restore targets

pub mod connection;
pub mod rows;
pub mod schema;


use super::restore::{RestoreCommand, sqlite_command};
use super::{Dialect, DialectDriver};
use crate::Result;
use crate::models::{ColumnInfo, DriverKind, Row};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::Path;

/// SQLite driver bound to one database file.
pub struct SqliteDriver {
    /// Read-only connection pool
    pub pool: SqlitePool,
    /// Connection name
    name: String,
    /// Original connection string
    connection_string: String,
}

impl std::fmt::Debug for SqliteDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDriver")
            .field("name", &self.name)
            .field("is_in_memory", &self.is_in_memory())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DialectDriver for SqliteDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Sqlite
    }

    fn connection_name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
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
        let database = self.restore_path()?;
        Ok(sqlite_command(&database, input))
    }

    async fn prepare_restore(&self) -> Result<()> {
        let database = self.restore_path()?;
        connection::backup_and_truncate(&database).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
