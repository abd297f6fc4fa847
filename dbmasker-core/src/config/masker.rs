//! Top-level masking configuration.

use super::{ConnectionDescriptor, ConnectionMaskConfig, DatabaseTarget, TableMaskConfig};
use crate::error::DbMaskerError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Rows per INSERT statement unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

const MAX_PARALLEL_CONNECTIONS: usize = 16;

/// Resolved configuration for a masking run.
///
/// When `connections` is empty, the default database target together with
/// the top-level `tables` and `exclude_tables` forms a single connection.
///
/// # Example
/// ```rust
/// use dbmasker_core::config::{DatabaseTarget, MaskerConfig};
///
/// let config = MaskerConfig::new()
///     .with_database("main", DatabaseTarget::new("sqlite://app.db"))
///     .with_batch_size(500);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.default_connection_name(), Some("main"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskerConfig {
    /// Named database targets
    pub databases: BTreeMap<String, DatabaseTarget>,
    /// Name of the target used by the legacy path and by restore
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_connection: Option<String>,
    /// Per-connection masking rules
    pub connections: BTreeMap<String, ConnectionMaskConfig>,
    /// Masking rules for the default connection when `connections` is empty
    pub tables: BTreeMap<String, TableMaskConfig>,
    /// Excluded tables for the default connection when `connections` is empty
    pub exclude_tables: Vec<String>,
    /// Rows per INSERT statement
    pub batch_size: usize,
    /// Directory for dump files when none is given explicitly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Number of connections dumped concurrently (1-16)
    pub max_parallel_connections: usize,
}

impl Default for MaskerConfig {
    fn default() -> Self {
        Self {
            databases: BTreeMap::new(),
            default_connection: None,
            connections: BTreeMap::new(),
            tables: BTreeMap::new(),
            exclude_tables: Vec::new(),
            batch_size: DEFAULT_BATCH_SIZE,
            output_path: None,
            max_parallel_connections: 1,
        }
    }
}

impl MaskerConfig {
    /// Creates an empty configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|source| DbMaskerError::Serialization {
                context: "Failed to parse masking configuration".to_string(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON configuration file.
    ///
    /// # Errors
    /// Returns an I/O error when the file cannot be read, and a
    /// serialization or configuration error when its content is invalid.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DbMaskerError::io(
                format!("Failed to read configuration file {}", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&content)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns error if configuration values are invalid
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(DbMaskerError::configuration(
                "batch_size must be greater than 0",
            ));
        }

        if self.max_parallel_connections == 0 {
            return Err(DbMaskerError::configuration(
                "max_parallel_connections must be greater than 0",
            ));
        }

        if self.max_parallel_connections > MAX_PARALLEL_CONNECTIONS {
            return Err(DbMaskerError::configuration(format!(
                "max_parallel_connections should not exceed {}",
                MAX_PARALLEL_CONNECTIONS
            )));
        }

        if let Some(name) = &self.default_connection
            && !self.databases.contains_key(name)
        {
            return Err(DbMaskerError::configuration(format!(
                "Default connection '{}' has no database target",
                name
            )));
        }

        for (name, target) in &self.databases {
            if target.url.trim().is_empty() {
                return Err(DbMaskerError::configuration(format!(
                    "Database target '{}' has an empty url",
                    name
                )));
            }
        }

        for (name, connection) in &self.connections {
            if let Some(file) = &connection.output_file
                && file.trim().is_empty()
            {
                return Err(DbMaskerError::configuration(format!(
                    "Connection '{}' has an empty output_file",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Builder method to add a database target.
    pub fn with_database(mut self, name: impl Into<String>, target: DatabaseTarget) -> Self {
        self.databases.insert(name.into(), target);
        self
    }

    /// Builder method to set the default connection.
    pub fn with_default_connection(mut self, name: impl Into<String>) -> Self {
        self.default_connection = Some(name.into());
        self
    }

    /// Builder method to add per-connection masking rules.
    pub fn with_connection(mut self, name: impl Into<String>, config: ConnectionMaskConfig) -> Self {
        self.connections.insert(name.into(), config);
        self
    }

    /// Builder method to add a legacy top-level table rule.
    pub fn with_table(mut self, table: impl Into<String>, config: TableMaskConfig) -> Self {
        self.tables.insert(table.into(), config);
        self
    }

    /// Builder method to add a legacy top-level exclusion.
    pub fn with_excluded_table(mut self, table: impl Into<String>) -> Self {
        self.exclude_tables.push(table.into());
        self
    }

    /// Builder method to set the batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Builder method to set the output directory.
    pub fn with_output_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_path = Some(path.into());
        self
    }

    /// Builder method to set connection parallelism.
    pub fn with_max_parallel_connections(mut self, max: usize) -> Self {
        self.max_parallel_connections = max;
        self
    }

    /// Name of the default connection: the configured one, or the only
    /// database target when exactly one exists.
    pub fn default_connection_name(&self) -> Option<&str> {
        if let Some(name) = &self.default_connection {
            return Some(name);
        }
        if self.databases.len() == 1 {
            return self.databases.keys().next().map(String::as_str);
        }
        None
    }

    /// Resolves the database target of a connection.
    ///
    /// # Errors
    /// Returns a configuration error when no target has that name.
    pub fn descriptor(&self, name: &str) -> Result<ConnectionDescriptor> {
        self.databases
            .get(name)
            .map(|target| ConnectionDescriptor::from_target(name, target))
            .ok_or_else(|| {
                DbMaskerError::configuration(format!(
                    "No database target configured for connection '{}'",
                    name
                ))
            })
    }

    /// Masking rules built from the legacy top-level settings.
    pub fn legacy_connection_config(&self) -> ConnectionMaskConfig {
        ConnectionMaskConfig {
            tables: self.tables.clone(),
            exclude_tables: self.exclude_tables.clone(),
            output_file: None,
        }
    }

    /// Connections to dump, in name order.
    ///
    /// With no explicit `connections`, this is the default connection with
    /// the top-level rules. A missing default is reported as `default` so the
    /// failure surfaces as that connection's error result.
    pub fn configured_connections(&self) -> Vec<(String, ConnectionMaskConfig)> {
        if !self.connections.is_empty() {
            return self
                .connections
                .iter()
                .map(|(name, config)| (name.clone(), config.clone()))
                .collect();
        }

        let name = self.default_connection_name().unwrap_or("default").to_string();
        vec![(name, self.legacy_connection_config())]
    }

    /// Masking rules for a connection, falling back to the legacy rules.
    pub fn connection_config(&self, name: &str) -> ConnectionMaskConfig {
        self.connections
            .get(name)
            .cloned()
            .unwrap_or_else(|| self.legacy_connection_config())
    }

    /// Output directory: the explicit argument, then `output_path`, then the
    /// current directory.
    pub fn resolve_output_dir(&self, explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.output_path.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
