//! Connection pool for the subscription store
//!
//! One shared pool per process; every query acquires and releases a
//! connection through sqlx, so neither the renewal sweep nor a callback
//! handler holds a connection while waiting on outside services.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Shared connection pool handle
pub type DbPool = PgPool;

/// The workload is one sweep a day plus sporadic callbacks; a handful of
/// connections covers it.
const MAX_CONNECTIONS: u32 = 5;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connect a pool sized for the subscription workload.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}
