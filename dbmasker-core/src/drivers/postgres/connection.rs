//! PostgreSQL connection pool creation.
//!
//! # Session Settings
//! Every pooled connection runs with `default_transaction_read_only = on`
//! and identifies itself through `application_name`.

use super::{DEFAULT_SCHEMA, PostgresDriver};
use crate::Result;
use crate::config::ConnectionDescriptor;
use crate::error::DbMaskerError;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

impl PostgresDriver {
    /// Creates a driver with a lazily connecting pool.
    ///
    /// # Errors
    /// Returns a connection error if the URL cannot be parsed. The error
    /// context only carries the redacted URL.
    pub async fn new(descriptor: &ConnectionDescriptor) -> Result<Self> {
        use sqlx::Executor;

        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET default_transaction_read_only = on")
                        .await?;
                    let app_name = format!("dbmasker-{}", env!("CARGO_PKG_VERSION"));
                    conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                        .await?;
                    Ok(())
                })
            })
            .connect_lazy(descriptor.url())
            .map_err(|e| {
                DbMaskerError::connection_failed(
                    format!(
                        "Failed to create PostgreSQL connection pool to {}",
                        descriptor.redacted_url()
                    ),
                    e,
                )
            })?;

        Ok(Self {
            pool,
            name: descriptor.name.clone(),
            schema: descriptor
                .schema
                .clone()
                .unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            connection_url: descriptor.url().to_string(),
        })
    }
}
