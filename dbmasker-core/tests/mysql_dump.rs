//! MySQL dump integration tests.
//!
//! These start a MySQL container and are ignored unless Docker is available:
//! `cargo test -- --ignored`.

#![cfg(feature = "mysql")]
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::uninlined_format_args)]

use dbmasker_core::{
    ColumnMaskSpec, DatabaseTarget, DbMaskerError, MaskerConfig, MaskingOrchestrator, Result,
    TableMaskConfig,
};
use sqlx::MySqlPool;
use std::time::Duration;
use tempfile::TempDir;
use testcontainers_modules::{mysql::Mysql, testcontainers::runners::AsyncRunner};

async fn wait_for_mysql_ready(database_url: &str, max_attempts: u32) -> Result<MySqlPool> {
    for attempt in 1..=max_attempts {
        if let Ok(pool) = MySqlPool::connect(database_url).await {
            if sqlx::query("SELECT 1").fetch_one(&pool).await.is_ok() {
                return Ok(pool);
            }
            pool.close().await;
        }
        if attempt < max_attempts {
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }
    Err(DbMaskerError::configuration(format!(
        "MySQL failed to become ready after {} attempts",
        max_attempts
    )))
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_mysql_container_dump() -> Result<()> {
    let mysql = Mysql::default().start().await.unwrap();
    let port = mysql.get_host_port_ipv4(3306).await.unwrap();
    let database_url = format!("mysql://root@localhost:{}/test", port);

    let pool = wait_for_mysql_ready(&database_url, 30).await?;
    for statement in [
        "CREATE TABLE users (
            id INT AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(100) NOT NULL,
            email VARCHAR(255) UNIQUE,
            active BIT(1) NOT NULL DEFAULT b'1',
            avatar BLOB,
            balance DECIMAL(10, 2)
        )",
        "INSERT INTO users (name, email, avatar, balance) VALUES
            ('John O''Brien', 'john@example.com', X'DEADBEEF', 12.50),
            ('Jane Roe', 'jane@example.com', NULL, NULL)",
        "CREATE VIEW active_users AS SELECT id, name FROM users WHERE active = 1",
    ] {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;

    let dir = TempDir::new().unwrap();
    let config = MaskerConfig::new()
        .with_database("app", DatabaseTarget::new(&database_url))
        .with_output_path(dir.path())
        .with_table(
            "users",
            TableMaskConfig::default().with_column("email", ColumnMaskSpec::new("email")),
        );

    let path = MaskingOrchestrator::new(config).create_masked_dump(None).await?;
    let dump = std::fs::read_to_string(path).unwrap();

    assert!(dump.contains("SET FOREIGN_KEY_CHECKS=0;"));
    assert!(dump.contains("DROP TABLE IF EXISTS `users`;"));
    assert!(dump.contains("CREATE TABLE `users`"));
    assert!(dump.contains("INSERT INTO `users`"));
    assert!(dump.contains("'John O\\'Brien'"));
    assert!(dump.to_ascii_uppercase().contains("X'DEADBEEF'"));
    assert!(dump.contains("12.50"));
    assert!(!dump.contains("john@example.com"));
    assert!(!dump.contains("active_users"));
    assert!(dump.trim_end().ends_with("SET FOREIGN_KEY_CHECKS=1;"));

    Ok(())
}
