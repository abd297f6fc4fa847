//! Append-only writer for dump artifacts.
//!
//! A dump is a banner, the dialect's integrity-deferral directive, a sequence
//! of SQL blocks (one DDL block per table followed by its INSERT batches) and
//! the integrity-restore directive. Blocks are separated by a blank line.

use crate::Result;
use crate::drivers::Dialect;
use crate::error::DbMaskerError;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Comment banner opening every dump.
pub fn dump_banner(connection: &str, generated_at: DateTime<Utc>) -> String {
    format!(
        "-- Database Masked Dump for connection '{}'\n-- Generated on: {}\n-- By: dbmasker {}\n\n",
        connection,
        generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        env!("CARGO_PKG_VERSION")
    )
}

/// Open dump file owned by a single connection's run.
#[derive(Debug)]
pub struct DumpWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    dialect: Dialect,
    blocks: usize,
}

impl DumpWriter {
    /// Creates or truncates `path` and writes the banner and the
    /// integrity-deferral directive. Missing parent directories are created.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be created or written.
    pub async fn create(path: &Path, connection: &str, dialect: Dialect) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DbMaskerError::io(
                    format!("Failed to create output directory {}", parent.display()),
                    e,
                )
            })?;
        }

        let file = File::create(path).await.map_err(|e| {
            DbMaskerError::io(format!("Failed to create dump file {}", path.display()), e)
        })?;

        let mut writer = Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            dialect,
            blocks: 0,
        };

        let header = format!(
            "{}{}\n\n",
            dump_banner(connection, Utc::now()),
            dialect.integrity_deferral()
        );
        writer.write(&header).await?;

        Ok(writer)
    }

    /// Appends one SQL block followed by a blank line.
    pub async fn append_block(&mut self, sql: &str) -> Result<()> {
        self.write(sql).await?;
        self.write("\n\n").await?;
        self.blocks += 1;
        Ok(())
    }

    /// Writes the integrity-restore directive, flushes and closes the file.
    ///
    /// # Errors
    /// Returns an I/O error if the footer cannot be written or flushed.
    pub async fn finish(mut self) -> Result<PathBuf> {
        let footer = format!("\n{}\n", self.dialect.integrity_restore());
        self.write(&footer).await?;
        self.writer.flush().await.map_err(|e| {
            DbMaskerError::io(format!("Failed to flush dump file {}", self.path.display()), e)
        })?;

        tracing::debug!(
            "Closed dump {} after {} blocks",
            self.path.display(),
            self.blocks
        );
        Ok(self.path)
    }

    async fn write(&mut self, text: &str) -> Result<()> {
        self.writer.write_all(text.as_bytes()).await.map_err(|e| {
            DbMaskerError::io(format!("Failed to write dump file {}", self.path.display()), e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_banner_lines() {
        let at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let banner = dump_banner("main", at);
        let lines: Vec<&str> = banner.lines().collect();

        assert_eq!(lines[0], "-- Database Masked Dump for connection 'main'");
        assert_eq!(lines[1], "-- Generated on: 2023-11-14 22:13:20 UTC");
        assert!(lines[2].starts_with("-- By: dbmasker "));
        assert!(banner.ends_with("\n\n"));
    }

    #[tokio::test]
    async fn test_dump_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("dump.sql");

        let mut writer = DumpWriter::create(&path, "main", Dialect::Sqlite)
            .await
            .unwrap();
        writer.append_block("CREATE TABLE t (a);").await.unwrap();
        writer
            .append_block("INSERT INTO \"t\" (\"a\") VALUES\n(1);")
            .await
            .unwrap();
        let written = writer.finish().await.unwrap();
        assert_eq!(written, path);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("-- Database Masked Dump for connection 'main'\n"));
        assert!(content.contains("\nPRAGMA foreign_keys=OFF;\nBEGIN TRANSACTION;\n\nCREATE TABLE t (a);\n\n"));
        assert!(content.ends_with("COMMIT;\nPRAGMA foreign_keys=ON;\n"));

        let deferral = content.find("BEGIN TRANSACTION;").unwrap();
        let create = content.find("CREATE TABLE").unwrap();
        let insert = content.find("INSERT INTO").unwrap();
        let commit = content.find("COMMIT;").unwrap();
        assert!(deferral < create && create < insert && insert < commit);
    }

    #[tokio::test]
    async fn test_create_truncates_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.sql");
        std::fs::write(&path, "stale content that must disappear").unwrap();

        DumpWriter::create(&path, "main", Dialect::MySql)
            .await
            .unwrap()
            .finish()
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.contains("SET FOREIGN_KEY_CHECKS=0;"));
        assert!(content.ends_with("SET FOREIGN_KEY_CHECKS=1;\n"));
    }
}
