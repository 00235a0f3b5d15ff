use async_trait::async_trait;
use fleetlock_core::StorageError;
use fleetlock_state::StorageBackend;
use sqlx::SqlitePool;

use crate::config::SqliteConfig;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS locks (
    group_name TEXT NOT NULL,
    id TEXT NOT NULL,
    created TEXT NOT NULL,
    PRIMARY KEY (group_name, id)
);";

const RESERVE: &str = "INSERT INTO locks (group_name, id, created)
    SELECT ?, ?, datetime('now')
    WHERE NOT EXISTS (
        SELECT 1 FROM locks WHERE group_name = ? AND id = ?
    );";

const GET_LOCKS: &str = "SELECT COUNT(*) FROM locks WHERE group_name = ?;";
const RELEASE: &str = "DELETE FROM locks WHERE group_name = ? AND id = ?;";
const HAS_LOCK: &str = "SELECT 1 FROM locks WHERE group_name = ? AND id = ?;";

/// `SQLite`-backed [`StorageBackend`]. A single connection is used since
/// `SQLite` serializes writers regardless.
pub struct SqliteBackend {
    pool: SqlitePool,
}

impl SqliteBackend {
    /// Open (or create) the database file and ensure the `locks` table
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the pool cannot be created,
    /// or [`StorageError::Backend`] if the schema cannot be created.
    pub async fn new(config: &SqliteConfig) -> Result<Self, StorageError> {
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&config.file)
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
impl StorageBackend for SqliteBackend {
    async fn reserve(&self, group: &str, id: &str) -> Result<(), StorageError> {
        sqlx::query(RESERVE)
            .bind(group)
            .bind(id)
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

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> SqliteConfig {
        SqliteConfig {
            file: "file::memory:?cache=shared".to_string(),
        }
    }

    #[tokio::test]
    async fn conformance() {
        let backend = SqliteBackend::new(&memory_config()).await.unwrap();
        fleetlock_state::testing::run_backend_conformance_tests(&backend)
            .await
            .unwrap();
    }
}
