use async_trait::async_trait;
use fleetlock_core::StorageError;
use fleetlock_state::StorageBackend;
use sqlx::PgPool;

use crate::config::PostgresConfig;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS locks (
    group_name VARCHAR(100) NOT NULL,
    id VARCHAR(100) NOT NULL,
    created TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (group_name, id)
);";

const RESERVE: &str = "INSERT INTO locks (group_name, id, created)
    SELECT $1, $2, NOW()
    WHERE NOT EXISTS (
        SELECT 1 FROM locks WHERE group_name = $1 AND id = $2
    );";

const GET_LOCKS: &str = "SELECT COUNT(*) FROM locks WHERE group_name = $1;";
const RELEASE: &str = "DELETE FROM locks WHERE group_name = $1 AND id = $2;";
const HAS_LOCK: &str = "SELECT 1 FROM locks WHERE group_name = $1 AND id = $2;";

/// `PostgreSQL`-backed [`StorageBackend`]. Reserve is a conditional insert
/// (`WHERE NOT EXISTS`) which provides at-most-once semantics across
/// replicas via the table's primary key.
pub struct PostgresBackend {
    pool: PgPool,
}

impl PostgresBackend {
    /// Connect and ensure the `locks` table exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the pool cannot be created,
    /// or [`StorageError::Backend`] if the schema cannot be created.
    pub async fn new(config: &PostgresConfig) -> Result<Self, StorageError> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.pool_size)
            .connect(&config.connection_url())
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl StorageBackend for PostgresBackend {
    async fn reserve(&self, group: &str, id: &str) -> Result<(), StorageError> {
        sqlx::query(RESERVE)
            .bind(group)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn get_locks(&self, group: &str) -> Result<usize, StorageError> {
        let (count,): (i64,) = sqlx::query_as(GET_LOCKS)
            .bind(group)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn release(&self, group: &str, id: &str) -> Result<(), StorageError> {
        sqlx::query(RELEASE)
            .bind(group)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn has_lock(&self, group: &str, id: &str) -> Result<bool, StorageError> {
        let row: Option<(i32,)> = sqlx::query_as(HAS_LOCK)
            .bind(group)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    fn test_config() -> PostgresConfig {
        PostgresConfig {
            database: std::env::var("FLEETLOCK_TEST_PG_DATABASE")
                .unwrap_or_else(|_| "fleetlock_test".to_string()),
            ..PostgresConfig::default()
        }
    }

    #[tokio::test]
    async fn conformance() {
        let backend = PostgresBackend::new(&test_config()).await.unwrap();
        fleetlock_state::testing::run_backend_conformance_tests(&backend)
            .await
            .unwrap();
    }
}
