//! End-to-end dump tests against SQLite files.
//!
//! Each test seeds a database in a temporary directory through a writable
//! pool, then runs the orchestrator against it.

#![cfg(feature = "sqlite")]
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::uninlined_format_args)]

use dbmasker_core::{
    ColumnMaskSpec, ConnectionMaskConfig, DatabaseTarget, DbMaskerError, MaskerConfig,
    MaskingOrchestrator, OperationStatus, TableMaskConfig,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::path::Path;
use tempfile::TempDir;

async fn seed(path: &Path, statements: &[&str]) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .journal_mode(SqliteJournalMode::Delete)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open seed database");
    for statement in statements {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Failed to seed database");
    }
    pool.close().await;
}

async fn seed_app(path: &Path) {
    seed(
        path,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, email TEXT, phone TEXT)",
            "INSERT INTO users (name, email, phone) VALUES ('John Doe', 'john@example.com', '555-0100')",
            "INSERT INTO users (name, email, phone) VALUES ('Jane Roe', 'jane@example.com', NULL)",
            "CREATE TABLE audit_log (id INTEGER PRIMARY KEY, message TEXT)",
            "CREATE TABLE events (id INTEGER PRIMARY KEY, note TEXT)",
            "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 2500) \
             INSERT INTO events (id, note) SELECT n, 'note ' || n FROM seq",
        ],
    )
    .await;
}

fn users_masked() -> TableMaskConfig {
    TableMaskConfig::default()
        .with_column("name", ColumnMaskSpec::new("name"))
        .with_column("email", ColumnMaskSpec::new("email"))
        .with_column(
            "phone",
            ColumnMaskSpec::new("phone").with_param("format", "###-###-####"),
        )
}

fn config_for(db: &Path, out: &Path) -> MaskerConfig {
    MaskerConfig::new()
        .with_database("app", DatabaseTarget::new(db.display().to_string()))
        .with_output_path(out)
}

// =============================================================================
// Masking Tests
// =============================================================================

#[tokio::test]
async fn test_sqlite_dump_never_contains_masked_originals() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("app.db");
    seed_app(&db).await;

    let config = config_for(&db, dir.path()).with_table("users", users_masked());
    let results = MaskingOrchestrator::new(config)
        .create_masked_dumps(None)
        .await;

    let result = &results["app"];
    assert_eq!(result.status, OperationStatus::Success, "{:?}", result.error);
    assert_eq!(result.tables_processed, Some(1));

    let dump = std::fs::read_to_string(result.output_file.as_ref().unwrap()).unwrap();
    assert!(!dump.contains("john@example.com"));
    assert!(!dump.contains("jane@example.com"));
    assert!(!dump.contains("John Doe"));
    assert!(!dump.contains("555-0100"));
    // NULL stays NULL
    assert!(dump.contains(", NULL)"));
    // Only the allow-listed table is dumped
    assert!(!dump.contains("events"));
    assert!(!dump.contains("audit_log"));
}

#[tokio::test]
async fn test_sqlite_unmasked_columns_are_copied() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("app.db");
    seed_app(&db).await;

    let mask = TableMaskConfig::default().with_column("email", ColumnMaskSpec::new("email"));
    let config = config_for(&db, dir.path()).with_table("users", mask);
    let path = MaskingOrchestrator::new(config)
        .create_masked_dump(Some(&dir.path().join("legacy.sql")))
        .await
        .unwrap();

    let dump = std::fs::read_to_string(path).unwrap();
    assert!(dump.contains("'John Doe'"));
    assert!(dump.contains("'555-0100'"));
    assert!(!dump.contains("john@example.com"));
}

#[tokio::test]
async fn test_sqlite_unmasked_reals_are_exact() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("measurements.db");
    seed(
        &db,
        &[
            "CREATE TABLE readings (id INTEGER PRIMARY KEY, value REAL, raw BLOB, note TEXT)",
            "INSERT INTO readings (value, raw, note) VALUES (0.1 + 0.2, X'00FF', 'it''s \\ ok')",
        ],
    )
    .await;

    let path = MaskingOrchestrator::new(config_for(&db, dir.path()))
        .create_masked_dump(None)
        .await
        .unwrap();

    let dump = std::fs::read_to_string(path).unwrap();
    assert!(dump.contains("(1, 0.30000000000000004, X'00FF', 'it''s \\ ok')"));
}

// =============================================================================
// Layout Tests
// =============================================================================

#[tokio::test]
async fn test_sqlite_dump_layout_and_batches() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("app.db");
    seed_app(&db).await;

    let config = config_for(&db, dir.path());
    let path = MaskingOrchestrator::new(config)
        .create_masked_dump(None)
        .await
        .unwrap();
    assert_eq!(path, dir.path().join("masked_database.sql"));

    let dump = std::fs::read_to_string(&path).unwrap();
    assert!(dump.starts_with("-- Database Masked Dump for connection 'app'\n"));
    assert!(dump.contains("PRAGMA foreign_keys=OFF;"));
    assert!(dump.trim_end().ends_with("PRAGMA foreign_keys=ON;"));

    // 2500 rows at the default batch size of 1000
    let statements: Vec<&str> = dump.split("INSERT INTO \"events\"").skip(1).collect();
    assert_eq!(statements.len(), 3);
    let last_rows = statements[2]
        .split(';')
        .next()
        .unwrap()
        .lines()
        .filter(|line| line.starts_with('('))
        .count();
    assert_eq!(last_rows, 500);

    // Empty table: DDL but no INSERT
    assert!(dump.contains("CREATE TABLE audit_log"));
    assert!(!dump.contains("INSERT INTO \"audit_log\""));
}

#[tokio::test]
async fn test_sqlite_exclusions_and_custom_batch_size() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("app.db");
    seed_app(&db).await;

    let config = config_for(&db, dir.path())
        .with_excluded_table("users")
        .with_excluded_table("audit_log")
        .with_batch_size(600);
    let path = MaskingOrchestrator::new(config)
        .create_masked_dump(None)
        .await
        .unwrap();

    let dump = std::fs::read_to_string(path).unwrap();
    assert!(!dump.contains("users"));
    assert_eq!(dump.matches("INSERT INTO \"events\"").count(), 5);
}

#[tokio::test]
async fn test_sqlite_missing_allow_listed_table() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("app.db");
    seed_app(&db).await;

    let config =
        config_for(&db, dir.path()).with_table("customers", TableMaskConfig::default());
    let err = MaskingOrchestrator::new(config)
        .create_masked_dump(None)
        .await
        .unwrap_err();

    assert!(matches!(err, DbMaskerError::Configuration { .. }));
    assert!(!dir.path().join("masked_database.sql").exists());
}

// =============================================================================
// Multi-Connection Tests
// =============================================================================

#[tokio::test]
async fn test_failures_are_isolated_per_connection() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("app.db");
    seed_app(&db).await;
    let out = dir.path().join("dumps");

    let config = config_for(&db, &out)
        .with_database("legacy", DatabaseTarget::new("oracle://scott:tiger@db/orcl"))
        .with_connection(
            "app",
            ConnectionMaskConfig::default().with_table("users", users_masked()),
        )
        .with_connection("legacy", ConnectionMaskConfig::default())
        .with_max_parallel_connections(2);

    let results = MaskingOrchestrator::new(config)
        .create_masked_dumps(None)
        .await;
    assert_eq!(results.len(), 2);

    let app = &results["app"];
    assert!(app.is_success(), "{:?}", app.error);
    assert_eq!(app.output_file.as_deref(), Some(out.join("masked_database_app.sql").as_path()));
    assert!(out.join("masked_database_app.sql").exists());

    let legacy = &results["legacy"];
    assert_eq!(legacy.status, OperationStatus::Error);
    let error = legacy.error.as_deref().unwrap();
    assert!(error.contains("Unsupported database engine"));
    assert!(!error.contains("tiger"));
}

#[tokio::test]
async fn test_connection_output_file_override() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("app.db");
    seed_app(&db).await;

    let config = config_for(&db, dir.path()).with_connection(
        "app",
        ConnectionMaskConfig::default()
            .with_excluded("events")
            .with_output_file("app-masked.sql"),
    );

    let results = MaskingOrchestrator::new(config)
        .create_masked_dumps(None)
        .await;
    assert!(results["app"].is_success());
    assert!(dir.path().join("app-masked.sql").exists());
}

#[tokio::test]
async fn test_missing_database_target() {
    let dir = TempDir::new().unwrap();
    let config = MaskerConfig::new()
        .with_output_path(dir.path())
        .with_connection("ghost", ConnectionMaskConfig::default());

    let results = MaskingOrchestrator::new(config)
        .create_masked_dumps(None)
        .await;
    let ghost = &results["ghost"];
    assert!(!ghost.is_success());
    assert!(ghost.error.as_deref().unwrap().contains("Configuration error"));
}
