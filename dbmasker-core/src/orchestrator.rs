//! Masking pipeline: connections, tables and batches into dump files.
//!
//! Per connection the pipeline resolves the database target and driver,
//! enumerates tables (exclusions first, then the allow-list), writes one DDL
//! block per table followed by one INSERT per non-empty batch, and closes the
//! dump with the integrity-restore directive.

use crate::Result;
use crate::config::{ConnectionMaskConfig, MaskerConfig, TableMaskConfig};
use crate::drivers::{self, DialectDriver};
use crate::dump::DumpWriter;
use crate::error::DbMaskerError;
use crate::maskers::{MaskerRegistry, ValueMasker};
use crate::models::OperationResult;
use futures::StreamExt;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name used by [`MaskingOrchestrator::create_masked_dump`] when no
/// output file is given.
pub const LEGACY_DUMP_FILE: &str = "masked_database.sql";

/// Number of batches needed for `total_rows` rows.
///
/// ```rust
/// use dbmasker_core::orchestrator::batch_count;
///
/// assert_eq!(batch_count(2500, 1000), 3);
/// assert_eq!(batch_count(0, 1000), 0);
/// ```
pub fn batch_count(total_rows: u64, batch_size: usize) -> u64 {
    let batch_size = u64::try_from(batch_size.max(1)).unwrap_or(u64::MAX);
    total_rows.div_ceil(batch_size)
}

/// Offsets of every batch, `i * batch_size` for each batch index.
pub fn batch_offsets(total_rows: u64, batch_size: usize) -> impl Iterator<Item = u64> {
    let step = u64::try_from(batch_size.max(1)).unwrap_or(u64::MAX);
    (0..batch_count(total_rows, batch_size)).map(move |i| i * step)
}

/// Drives dumps and restores for the configured connections.
#[derive(Debug, Clone)]
pub struct MaskingOrchestrator {
    config: MaskerConfig,
    registry: Arc<MaskerRegistry>,
}

impl MaskingOrchestrator {
    /// Creates an orchestrator with the built-in maskers.
    pub fn new(config: MaskerConfig) -> Self {
        Self::with_registry(config, Arc::new(MaskerRegistry::new()))
    }

    /// Creates an orchestrator sharing an existing registry.
    pub fn with_registry(config: MaskerConfig, registry: Arc<MaskerRegistry>) -> Self {
        Self { config, registry }
    }

    /// Registers a custom masker, checked before every built-in one.
    pub fn register_masker(&mut self, masker: Arc<dyn ValueMasker>) {
        Arc::make_mut(&mut self.registry).register(masker);
    }

    /// The configuration this orchestrator runs with.
    pub fn config(&self) -> &MaskerConfig {
        &self.config
    }

    /// The masker registry shared by every connection.
    pub fn registry(&self) -> &MaskerRegistry {
        &self.registry
    }

    /// Dumps every configured connection into `output_dir` (or the
    /// configured output path).
    ///
    /// Failures are isolated per connection and reported as error results;
    /// up to `max_parallel_connections` connections run concurrently.
    pub async fn create_masked_dumps(
        &self,
        output_dir: Option<&Path>,
    ) -> BTreeMap<String, OperationResult> {
        let dir = self.config.resolve_output_dir(output_dir);
        let connections = self.config.configured_connections();
        let parallelism = self.config.max_parallel_connections.max(1);

        tracing::info!(
            "Dumping {} connection(s) into {} ({} at a time)",
            connections.len(),
            dir.display(),
            parallelism
        );

        futures::stream::iter(connections)
            .map(|(name, mask_config)| {
                let path = dir.join(mask_config.output_file_name(&name));
                async move {
                    let result = self.run_dump(&name, &mask_config, path).await;
                    (name, result)
                }
            })
            .buffered(parallelism)
            .collect()
            .await
    }

    /// Dumps a single connection, reporting failures in the result.
    ///
    /// Without `output_file`, the dump goes to the connection's configured
    /// file name inside the configured output directory.
    pub async fn create_masked_dump_for_connection(
        &self,
        name: &str,
        mask_config: &ConnectionMaskConfig,
        output_file: Option<&Path>,
    ) -> OperationResult {
        let path = output_file.map(Path::to_path_buf).unwrap_or_else(|| {
            self.config
                .resolve_output_dir(None)
                .join(mask_config.output_file_name(name))
        });
        self.run_dump(name, mask_config, path).await
    }

    /// Dumps the default connection with the top-level table rules.
    ///
    /// # Errors
    /// Propagates any failure instead of wrapping it in a result.
    pub async fn create_masked_dump(&self, output_file: Option<&Path>) -> Result<PathBuf> {
        let name = self.config.default_connection_name().ok_or_else(|| {
            DbMaskerError::configuration(
                "No default connection configured; set default_connection",
            )
        })?;
        let path = output_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.resolve_output_dir(None).join(LEGACY_DUMP_FILE));

        self.dump_connection(name, &self.config.legacy_connection_config(), &path)
            .await?;
        Ok(path)
    }

    /// Replays a dump into a connection (the default one when `None`).
    ///
    /// # Errors
    /// Returns `MissingInputFile` before any driver is created when `input`
    /// does not exist, and `RestoreFailure` when the client fails.
    pub async fn restore_masked_dump(&self, input: &Path, connection: Option<&str>) -> Result<()> {
        if !tokio::fs::try_exists(input).await.unwrap_or(false) {
            return Err(DbMaskerError::MissingInputFile {
                path: input.to_path_buf(),
            });
        }

        let name = connection
            .or_else(|| self.config.default_connection_name())
            .ok_or_else(|| {
                DbMaskerError::configuration("No connection given and no default connection configured")
            })?;
        let descriptor = self.config.descriptor(name)?;
        let driver = drivers::connect(&descriptor).await?;

        let result = driver.restore(input).await;
        driver.close().await;

        if result.is_ok() {
            tracing::info!("Restored {} into connection '{}'", input.display(), name);
        }
        result
    }

    async fn run_dump(
        &self,
        name: &str,
        mask_config: &ConnectionMaskConfig,
        path: PathBuf,
    ) -> OperationResult {
        match self.dump_connection(name, mask_config, &path).await {
            Ok(tables) => OperationResult::success(name, path, tables),
            Err(e) => {
                tracing::error!("Failed to dump connection '{}': {}", name, e);
                OperationResult::failure(name, e)
            }
        }
    }

    async fn dump_connection(
        &self,
        name: &str,
        mask_config: &ConnectionMaskConfig,
        path: &Path,
    ) -> Result<usize> {
        let descriptor = self.config.descriptor(name)?;
        let driver = drivers::connect(&descriptor).await?;

        tracing::info!("Creating masked dump for connection '{}'", name);
        let result = self.dump_with_driver(driver.as_ref(), mask_config, path).await;
        driver.close().await;

        if let Ok(tables) = &result {
            tracing::info!(
                "Connection '{}': {} table(s) written to {}",
                name,
                tables,
                path.display()
            );
        }
        result
    }

    /// Runs the dump pipeline on an already connected driver.
    ///
    /// Returns the number of tables written.
    pub async fn dump_with_driver(
        &self,
        driver: &dyn DialectDriver,
        mask_config: &ConnectionMaskConfig,
        path: &Path,
    ) -> Result<usize> {
        let tables = resolve_tables(driver, mask_config).await?;

        let mut writer = driver.write_dump_header(path).await?;
        for table in &tables {
            self.dump_table(driver, &mut writer, table, mask_config.table(table))
                .await?;
        }
        driver.write_dump_footer(writer).await?;

        Ok(tables.len())
    }

    async fn dump_table(
        &self,
        driver: &dyn DialectDriver,
        writer: &mut DumpWriter,
        table: &str,
        mask: Option<&TableMaskConfig>,
    ) -> Result<()> {
        writer.append_block(&driver.table_definition(table).await?).await?;

        let total = driver.count_rows(table).await?;
        if total == 0 {
            tracing::debug!("Table '{}' is empty", table);
            return Ok(());
        }

        let columns = driver.columns(table).await?;
        let batch_size = self.config.batch_size;
        tracing::info!(
            "Processing table '{}' ({} rows, {} batch(es))",
            table,
            total,
            batch_count(total, batch_size)
        );

        for offset in batch_offsets(total, batch_size) {
            let rows = driver.fetch_rows(table, &columns, offset, batch_size).await?;
            tracing::debug!("Table '{}': {} row(s) at offset {}", table, rows.len(), offset);

            if let Some(insert) =
                driver.build_insert_statement(table, &columns, &rows, mask, &self.registry)?
            {
                writer.append_block(&insert).await?;
            }
        }

        Ok(())
    }
}

/// Catalog tables minus exclusions, restricted to the allow-list if any.
///
/// # Errors
/// Returns a configuration error naming an allow-listed table that is
/// neither present nor excluded.
async fn resolve_tables(
    driver: &dyn DialectDriver,
    mask_config: &ConnectionMaskConfig,
) -> Result<Vec<String>> {
    let available = driver.list_tables(&mask_config.exclude_tables).await?;

    let Some(allowed) = mask_config.allow_list() else {
        return Ok(available);
    };

    let excluded = mask_config.exclusions();
    if let Some(missing) = allowed
        .iter()
        .find(|t| !excluded.contains(**t) && !available.iter().any(|a| a == **t))
    {
        return Err(DbMaskerError::configuration(format!(
            "Table '{}' is configured for connection '{}' but does not exist",
            missing,
            driver.connection_name()
        )));
    }

    Ok(available
        .into_iter()
        .filter(|t| allowed.contains(&t.as_str()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnMaskSpec, DatabaseTarget};
    use crate::drivers::{Dialect, RestoreCommand};
    use crate::models::{ColumnInfo, DriverKind, Row, SqlValue};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// In-memory driver serving generated rows for fixed tables.
    struct FakeDriver {
        tables: Vec<(String, u64)>,
        fetches: Mutex<Vec<(String, u64, usize)>>,
    }

    impl FakeDriver {
        fn new(tables: &[(&str, u64)]) -> Self {
            Self {
                tables: tables.iter().map(|(t, n)| (t.to_string(), *n)).collect(),
                fetches: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DialectDriver for FakeDriver {
        fn kind(&self) -> DriverKind {
            DriverKind::Sqlite
        }

        fn connection_name(&self) -> &str {
            "fake"
        }

        fn dialect(&self) -> Dialect {
            Dialect::Sqlite
        }

        async fn list_tables(&self, exclude: &[String]) -> Result<Vec<String>> {
            Ok(self
                .tables
                .iter()
                .map(|(t, _)| t.clone())
                .filter(|t| !exclude.contains(t))
                .collect())
        }

        async fn table_definition(&self, table: &str) -> Result<String> {
            Ok(format!("CREATE TABLE \"{}\" (id, email);", table))
        }

        async fn columns(&self, _table: &str) -> Result<Vec<ColumnInfo>> {
            Ok(vec![
                ColumnInfo::new("id", "integer"),
                ColumnInfo::new("email", "text"),
            ])
        }

        async fn count_rows(&self, table: &str) -> Result<u64> {
            Ok(self
                .tables
                .iter()
                .find(|(t, _)| t == table)
                .map_or(0, |(_, n)| *n))
        }

        async fn fetch_rows(
            &self,
            table: &str,
            _columns: &[ColumnInfo],
            offset: u64,
            limit: usize,
        ) -> Result<Vec<Row>> {
            self.fetches
                .lock()
                .unwrap()
                .push((table.to_string(), offset, limit));
            let total = self.count_rows(table).await?;
            Ok((offset..total.min(offset + limit as u64))
                .map(|i| {
                    vec![
                        SqlValue::Numeric(i.to_string()),
                        SqlValue::from(format!("user{}@example.com", i)),
                    ]
                })
                .collect())
        }

        fn restore_command(&self, _input: &Path) -> Result<RestoreCommand> {
            Err(DbMaskerError::unsupported_feature("restore", "fake"))
        }

        async fn close(&self) {}
    }

    fn orchestrator(batch_size: usize) -> MaskingOrchestrator {
        MaskingOrchestrator::new(MaskerConfig::new().with_batch_size(batch_size))
    }

    #[test]
    fn test_batch_arithmetic() {
        assert_eq!(batch_count(2500, 1000), 3);
        assert_eq!(batch_count(1000, 1000), 1);
        assert_eq!(batch_count(1, 1000), 1);
        assert_eq!(batch_count(0, 1000), 0);
        assert_eq!(
            batch_offsets(2500, 1000).collect::<Vec<_>>(),
            vec![0, 1000, 2000]
        );
        assert_eq!(batch_offsets(0, 1000).count(), 0);
    }

    #[tokio::test]
    async fn test_dump_batches_and_masks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.sql");
        let driver = FakeDriver::new(&[("users", 25), ("empty", 0)]);
        let mask_config = ConnectionMaskConfig::default();

        let tables = orchestrator(10)
            .dump_with_driver(&driver, &mask_config, &path)
            .await
            .unwrap();
        assert_eq!(tables, 2);

        let fetches = driver.fetches.lock().unwrap().clone();
        assert_eq!(
            fetches,
            vec![
                ("users".to_string(), 0, 10),
                ("users".to_string(), 10, 10),
                ("users".to_string(), 20, 10),
            ]
        );

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("INSERT INTO \"users\"").count(), 3);
        assert!(content.contains("CREATE TABLE \"empty\""));
        assert!(!content.contains("INSERT INTO \"empty\""));
    }

    #[tokio::test]
    async fn test_allow_list_masks_configured_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.sql");
        let driver = FakeDriver::new(&[("users", 3), ("orders", 2)]);
        let mask_config = ConnectionMaskConfig::default().with_table(
            "users",
            TableMaskConfig::default().with_column("email", ColumnMaskSpec::new("email")),
        );

        let tables = orchestrator(1000)
            .dump_with_driver(&driver, &mask_config, &path)
            .await
            .unwrap();
        assert_eq!(tables, 1);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("orders"));
        for i in 0..3 {
            assert!(!content.contains(&format!("'user{}@example.com'", i)));
        }
        assert_eq!(content.matches("INSERT INTO").count(), 1);
    }

    #[tokio::test]
    async fn test_missing_allow_listed_table_fails_before_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.sql");
        let driver = FakeDriver::new(&[("users", 3)]);
        let mask_config =
            ConnectionMaskConfig::default().with_table("ghosts", TableMaskConfig::default());

        let err = orchestrator(1000)
            .dump_with_driver(&driver, &mask_config, &path)
            .await
            .unwrap_err();
        assert!(matches!(err, DbMaskerError::Configuration { .. }));
        assert!(err.to_string().contains("ghosts"));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_excluded_allow_listed_table_is_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.sql");
        let driver = FakeDriver::new(&[("users", 1), ("sessions", 1)]);
        let mask_config = ConnectionMaskConfig::default()
            .with_table("users", TableMaskConfig::default())
            .with_table("sessions", TableMaskConfig::default())
            .with_excluded("sessions");

        let tables = orchestrator(1000)
            .dump_with_driver(&driver, &mask_config, &path)
            .await
            .unwrap();
        assert_eq!(tables, 1);
        assert!(!std::fs::read_to_string(&path).unwrap().contains("sessions"));
    }

    #[tokio::test]
    async fn test_unknown_engine_becomes_error_result() {
        let dir = TempDir::new().unwrap();
        let config = MaskerConfig::new().with_database(
            "legacy",
            DatabaseTarget::new("oracle://scott:tiger@db/orcl"),
        );
        let results = MaskingOrchestrator::new(config)
            .create_masked_dumps(Some(dir.path()))
            .await;

        let result = &results["legacy"];
        assert!(!result.is_success());
        assert!(result.error.as_deref().unwrap().contains("Unsupported database engine"));
        assert!(!result.error.as_deref().unwrap().contains("tiger"));
    }

    #[tokio::test]
    async fn test_restore_missing_file_fails_first() {
        // No database targets at all: the input check must come first
        let err = MaskingOrchestrator::new(MaskerConfig::new())
            .restore_masked_dump(Path::new("/nonexistent/dump.sql"), Some("nowhere"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbMaskerError::MissingInputFile { .. }));
    }

    #[tokio::test]
    async fn test_legacy_dump_requires_default_connection() {
        let err = MaskingOrchestrator::new(MaskerConfig::new())
            .create_masked_dump(None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbMaskerError::Configuration { .. }));
    }

    #[test]
    fn test_register_masker_prepends() {
        #[derive(Debug)]
        struct Constant;
        impl ValueMasker for Constant {
            fn name(&self) -> &str {
                "constant"
            }
            fn supports(&self, semantic_type: &str) -> bool {
                semantic_type == "email"
            }
            fn generate(&self, _: &SqlValue, _: &ColumnMaskSpec) -> Result<SqlValue> {
                Ok(SqlValue::from("redacted"))
            }
        }

        let mut orchestrator = orchestrator(10);
        orchestrator.register_masker(Arc::new(Constant));
        assert_eq!(orchestrator.registry().resolve("email").name(), "constant");
    }
}
