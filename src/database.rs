use sqlx::{mysql::MySqlPoolOptions, Connection};

use crate::{configuration::DatabaseConfig, DbPool};

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to reach the database at {dsn}")]
    Unreachable {
        dsn: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("Timed out after {timeout:?} waiting for the database at {dsn}")]
    Timeout {
        dsn: String,
        timeout: std::time::Duration,
    },
}

/// Opens the pool without establishing any connection.
pub fn connect_lazy(config: &DatabaseConfig) -> DbPool {
    MySqlPoolOptions::new()
        .acquire_timeout(config.timeout)
        .connect_lazy_with(config.connect_options())
}

/// Opens the pool and pings the server once; the pool is only returned
/// when the database answered within the configured timeout.
#[tracing::instrument(name = "Connecting to the database", skip_all, fields(dsn = %config.redacted_dsn()))]
pub async fn connect(config: &DatabaseConfig) -> Result<DbPool, DatabaseError> {
    let pool = connect_lazy(config);
    let ping = async {
        let mut conn = pool.acquire().await?;
        conn.ping().await
    };
    match tokio::time::timeout(config.timeout, ping).await {
        Ok(Ok(())) => {
            tracing::info!("Database is reachable");
            Ok(pool)
        }
        Ok(Err(source)) => Err(DatabaseError::Unreachable {
            dsn: config.redacted_dsn(),
            source,
        }),
        Err(_) => Err(DatabaseError::Timeout {
            dsn: config.redacted_dsn(),
            timeout: config.timeout,
        }),
    }
}
