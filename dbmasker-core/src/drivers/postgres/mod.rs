//! PostgreSQL dialect driver.
//!
//! # Module Structure
//! - `connection`: Lazy pool creation with read-only session settings
//! - `schema`: `pg_tables` enumeration and DDL extraction with a fallback
//!   reconstruction from `information_schema.columns`
//! - `rows`: Row counting and batched fetching through `::text` casts
//!
//! # Limitations
//! `pg_get_tabledef` is not part of stock PostgreSQL. Without it the DDL is
//! reconstructed and only carries column names, types, nullability and
//! defaults. Constraints and indexes are not reproduced. Sequences behind
//! `nextval(..)` defaults are recreated empty, because `DROP TABLE .. CASCADE`
//! drops them, so after a restore they start again at 1 while the restored
//! rows keep their original ids. Identity columns lose their identity
//! property.

pub mod connection;
pub mod rows;
pub mod schema;


use super::restore::{RestoreCommand, RestoreTarget, psql_command};
use super::{Dialect, DialectDriver};
use crate::Result;
use crate::models::{ColumnInfo, DriverKind, Row};
use async_trait::async_trait;
use sqlx::PgPool;
use std::path::Path;

/// Schema dumped when the connection does not name one.
pub const DEFAULT_SCHEMA: &str = "public";

/// PostgreSQL driver bound to one schema of one database.
pub struct PostgresDriver {
    /// Connection pool for database operations
    pub pool: PgPool,
    name: String,
    schema: String,
    connection_url: String,
}

impl std::fmt::Debug for PostgresDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresDriver")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("pool_size", &self.pool.size())
            .field("pool_idle", &self.pool.num_idle())
            .finish_non_exhaustive()
    }
}

impl PostgresDriver {
    /// Schema whose tables are dumped.
    pub fn schema(&self) -> &str {
        &self.schema
    }
}

#[async_trait]
impl DialectDriver for PostgresDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Postgres
    }

    fn connection_name(&self) -> &str {
        &self.name
    }

    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn list_tables(&self, exclude: &[String]) -> Result<Vec<String>> {
        schema::list_tables(&self.pool, &self.schema, exclude).await
    }

    async fn table_definition(&self, table: &str) -> Result<String> {
        schema::table_definition(&self.pool, &self.schema, table).await
    }

    async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        schema::columns(&self.pool, &self.schema, table).await
    }

    async fn count_rows(&self, table: &str) -> Result<u64> {
        rows::count_rows(&self.pool, &self.schema, table).await
    }

    async fn fetch_rows(
        &self,
        table: &str,
        columns: &[ColumnInfo],
        offset: u64,
        limit: usize,
    ) -> Result<Vec<Row>> {
        rows::fetch_rows(&self.pool, &self.schema, table, columns, offset, limit).await
    }

    fn restore_command(&self, input: &Path) -> Result<RestoreCommand> {
        let target = RestoreTarget::from_url(&self.connection_url)?;
        Ok(psql_command(&target, input))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
