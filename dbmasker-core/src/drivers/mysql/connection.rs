//! MySQL connection pool creation.

use super::MySqlDriver;
use crate::Result;
use crate::config::ConnectionDescriptor;
use crate::error::DbMaskerError;
use sqlx::mysql::MySqlPoolOptions;
use std::time::Duration;

const MAX_CONNECTIONS: u32 = 2;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

impl MySqlDriver {
    /// Creates a driver with a lazily connecting pool.
    ///
    /// # Errors
    /// Returns a connection error if the URL cannot be parsed. The error
    /// context only carries the redacted URL.
    pub async fn new(descriptor: &ConnectionDescriptor) -> Result<Self> {
        let connection_url = normalize_url(descriptor.url());

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(&connection_url)
            .map_err(|e| {
                DbMaskerError::connection_failed(
                    format!("Invalid MySQL connection URL {}", descriptor.redacted_url()),
                    e,
                )
            })?;

        Ok(Self {
            pool,
            name: descriptor.name.clone(),
            connection_url,
        })
    }
}

/// Rewrites `mariadb://` URLs to the `mysql://` scheme understood by sqlx.
pub(crate) fn normalize_url(url: &str) -> String {
    match url.strip_prefix("mariadb://") {
        Some(rest) => format!("mysql://{}", rest),
        None => url.to_string(),
    }
}
