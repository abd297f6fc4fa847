//! Dialect drivers and factory for per-engine database access.
//!
//! Every engine implements [`DialectDriver`]: table enumeration, DDL
//! extraction, column introspection, batched row fetching and restore
//! invocation. SQL text generation is shared through [`sql`].
//!
//! # Module Structure
//! - `sql`: literal formatting, identifier quoting and INSERT assembly
//! - `restore`: command-line client invocation for restores
//! - Engine modules (`mysql`, `postgres`, `sqlite`), each behind its feature

use crate::Result;
use crate::config::{ConnectionDescriptor, TableMaskConfig};
use crate::dump::DumpWriter;
use crate::error::DbMaskerError;
use crate::maskers::MaskerRegistry;
use crate::models::{ColumnInfo, DriverKind, Row, SqlValue};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod restore;
pub mod sql;

pub use restore::{RestoreCommand, RestoreTarget, run_restore};
pub use sql::{Dialect, FetchKind, build_insert_statement};

/// Per-engine operations bound to one connection.
///
/// # Security Guarantees
/// - Dump operations only read from the source database
/// - Connection URLs are never logged or included in errors
///
/// # Object Safety
/// This trait is object-safe; the orchestrator works through
/// `Box<dyn DialectDriver>`.
#[async_trait]
pub trait DialectDriver: Send + Sync {
    /// Engine handled by this driver.
    fn kind(&self) -> DriverKind;

    /// Name of the connection this driver is bound to.
    fn connection_name(&self) -> &str;

    /// SQL flavour used for generated statements.
    fn dialect(&self) -> Dialect;

    /// Lists tables in catalog order, without the excluded names.
    ///
    /// # Errors
    /// Returns a query error if the catalog cannot be read.
    async fn list_tables(&self, exclude: &[String]) -> Result<Vec<String>>;

    /// `DROP TABLE IF EXISTS` followed by the table's `CREATE` statement.
    ///
    /// # Errors
    /// Returns a driver error naming the table.
    async fn table_definition(&self, table: &str) -> Result<String>;

    /// Columns of a table in ordinal order.
    async fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Total number of rows in a table.
    async fn count_rows(&self, table: &str) -> Result<u64>;

    /// One page of rows, values aligned with `columns`.
    async fn fetch_rows(
        &self,
        table: &str,
        columns: &[ColumnInfo],
        offset: u64,
        limit: usize,
    ) -> Result<Vec<Row>>;

    /// Command replaying a dump into this connection's database.
    ///
    /// # Errors
    /// Returns an error if the connection cannot be a restore target.
    fn restore_command(&self, input: &Path) -> Result<RestoreCommand>;

    /// Prepares the target before the client runs.
    async fn prepare_restore(&self) -> Result<()> {
        Ok(())
    }

    /// Replays a dump file into this connection's database.
    ///
    /// # Errors
    /// Returns `RestoreFailure` with the client's captured output when the
    /// client cannot be started or exits unsuccessfully.
    async fn restore(&self, input: &Path) -> Result<()> {
        let command = self.restore_command(input)?;
        self.prepare_restore().await?;
        tracing::info!(
            "Restoring {} into connection '{}' with {}",
            input.display(),
            self.connection_name(),
            command.program
        );
        run_restore(&command).await
    }

    /// Closes the connection pool.
    async fn close(&self);

    /// Renders a value as a literal of this driver's dialect.
    fn format_literal(&self, value: &SqlValue) -> String {
        self.dialect().format_literal(value)
    }

    /// Quotes an identifier for this driver's dialect.
    fn quote_identifier(&self, name: &str) -> String {
        self.dialect().quote_identifier(name)
    }

    /// One multi-row INSERT for a batch, or `None` for an empty batch.
    fn build_insert_statement(
        &self,
        table: &str,
        columns: &[ColumnInfo],
        rows: &[Row],
        mask: Option<&TableMaskConfig>,
        registry: &MaskerRegistry,
    ) -> Result<Option<String>> {
        build_insert_statement(self.dialect(), table, columns, rows, mask, registry)
    }

    /// Creates the dump file with banner and integrity-deferral directive.
    async fn write_dump_header(&self, path: &Path) -> Result<DumpWriter> {
        DumpWriter::create(path, self.connection_name(), self.dialect()).await
    }

    /// Writes the integrity-restore directive and closes the dump.
    async fn write_dump_footer(&self, writer: DumpWriter) -> Result<PathBuf> {
        writer.finish().await
    }
}

impl std::fmt::Debug for dyn DialectDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialectDriver")
            .field("kind", &self.kind())
            .field("connection", &self.connection_name())
            .finish_non_exhaustive()
    }
}

/// Removes excluded names, keeping catalog order.
pub(crate) fn filter_excluded(tables: Vec<String>, exclude: &[String]) -> Vec<String> {
    tables
        .into_iter()
        .filter(|t| !exclude.iter().any(|e| e == t))
        .collect()
}

/// Creates the driver for a connection.
///
/// The pool connects lazily, so this only fails for unsupported engines and
/// malformed URLs.
///
/// # Errors
/// Returns `UnsupportedEngine` for unknown engine kinds and
/// `UnsupportedFeature` for engines compiled out of this build.
pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Box<dyn DialectDriver>> {
    tracing::debug!("Creating driver for {}", descriptor);

    match &descriptor.kind {
        #[cfg(feature = "mysql")]
        DriverKind::MySql => Ok(Box::new(mysql::MySqlDriver::new(descriptor).await?)),
        #[cfg(not(feature = "mysql"))]
        DriverKind::MySql => Err(DbMaskerError::unsupported_feature(
            "MySQL driver",
            "Compile with --features mysql to enable MySQL support",
        )),
        #[cfg(feature = "postgresql")]
        DriverKind::Postgres => Ok(Box::new(postgres::PostgresDriver::new(descriptor).await?)),
        #[cfg(not(feature = "postgresql"))]
        DriverKind::Postgres => Err(DbMaskerError::unsupported_feature(
            "PostgreSQL driver",
            "Compile with --features postgresql to enable PostgreSQL support",
        )),
        #[cfg(feature = "sqlite")]
        DriverKind::Sqlite => Ok(Box::new(sqlite::SqliteDriver::new(descriptor).await?)),
        #[cfg(not(feature = "sqlite"))]
        DriverKind::Sqlite => Err(DbMaskerError::unsupported_feature(
            "SQLite driver",
            "Compile with --features sqlite to enable SQLite support",
        )),
        DriverKind::Unsupported(engine) => Err(DbMaskerError::UnsupportedEngine {
            engine: engine.clone(),
            connection: descriptor.name.clone(),
        }),
    }
}

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "postgresql")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_engine_is_unsupported() {
        let descriptor = ConnectionDescriptor::new(
            "legacy",
            DriverKind::parse("oracle"),
            "oracle://scott:tiger@db/orcl",
        );
        let err = connect(&descriptor).await.unwrap_err();

        match err {
            DbMaskerError::UnsupportedEngine { engine, connection } => {
                assert_eq!(engine, "oracle");
                assert_eq!(connection, "legacy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_filter_excluded_keeps_order() {
        let tables = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let filtered = filter_excluded(tables, &["a".to_string()]);
        assert_eq!(filtered, vec!["b", "c"]);
    }
}
