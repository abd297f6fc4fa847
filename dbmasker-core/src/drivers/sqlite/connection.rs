//! SQLite connection handling.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db`, `sqlite://./relative.db`,
//!   `sqlite:relative.db` or a bare `.db`/`.sqlite`/`.sqlite3` path
//! - In-memory: `sqlite::memory:` or `:memory:` (dump only)

use super::SqliteDriver;
use crate::Result;
use crate::config::ConnectionDescriptor;
use crate::error::DbMaskerError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

impl SqliteDriver {
    /// Creates a driver with a lazy, read-only pool.
    ///
    /// # Errors
    /// Returns a configuration error if the connection string cannot be
    /// parsed.
    pub async fn new(descriptor: &ConnectionDescriptor) -> Result<Self> {
        let connection_string = descriptor.url().to_string();
        let options = SqliteConnectOptions::from_str(&normalize_connection_string(
            &connection_string,
        ))
        .map_err(|e| {
            DbMaskerError::configuration(format!(
                "Invalid SQLite connection string for '{}': {}",
                descriptor.name, e
            ))
        })?
        .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(30))
            .connect_lazy_with(options);

        Ok(Self {
            pool,
            name: descriptor.name.clone(),
            connection_string,
        })
    }

    /// Checks if the connection is to an in-memory database.
    pub fn is_in_memory(&self) -> bool {
        is_in_memory(&self.connection_string)
    }

    /// Database file path, or `None` for in-memory databases.
    pub fn database_path(&self) -> Option<PathBuf> {
        database_path(&self.connection_string)
    }

    /// Database file a restore writes to.
    pub(crate) fn restore_path(&self) -> Result<PathBuf> {
        self.database_path().ok_or_else(|| {
            DbMaskerError::unsupported_feature("Restore into an in-memory database", "SQLite")
        })
    }
}

pub(crate) fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}

/// Extracts the file path from a connection string.
pub(crate) fn database_path(connection_string: &str) -> Option<PathBuf> {
    if is_in_memory(connection_string) {
        return None;
    }

    let path = connection_string
        .strip_prefix("sqlite://")
        .or_else(|| connection_string.strip_prefix("sqlite:"))
        .unwrap_or(connection_string);
    let path = path.split('?').next().unwrap_or(path);

    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// Normalizes connection string to SQLite URL format.
pub(crate) fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }

    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }

    format!("sqlite://{}", connection_string)
}

/// Copies an existing database to `<file>.backup`, then empties it.
pub(crate) async fn backup_and_truncate(database: &Path) -> Result<()> {
    if tokio::fs::try_exists(database).await.unwrap_or(false) {
        let mut backup = database.as_os_str().to_owned();
        backup.push(".backup");
        let backup = PathBuf::from(backup);

        tokio::fs::copy(database, &backup).await.map_err(|e| {
            DbMaskerError::io(
                format!("Failed to back up {} to {}", database.display(), backup.display()),
                e,
            )
        })?;
        tracing::info!("Backed up {} to {}", database.display(), backup.display());
    }

    tokio::fs::File::create(database).await.map_err(|e| {
        DbMaskerError::io(format!("Failed to truncate {}", database.display()), e)
    })?;

    Ok(())
}
