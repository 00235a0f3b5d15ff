use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Pool, Runtime};
use fleetlock_core::StorageError;
use fleetlock_state::StorageBackend;
use redis::AsyncCommands;

use crate::config::{render_lock_key, RedisConfig};

/// KV-with-sets [`StorageBackend`]: a per-lock key (`SETNX` for
/// idempotency) plus a per-group set whose cardinality is the lock count.
/// Release is a two-step delete; readers tolerate momentary inconsistency
/// (`get_locks` is advisory — the Lock Manager re-checks under its write
/// lock before trusting it).
pub struct RedisBackend {
    pool: Pool,
}

impl RedisBackend {
    /// Build a connection pool and verify connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Connection`] if the pool cannot be created
    /// or the initial ping fails.
    pub async fn new(config: &RedisConfig) -> Result<Self, StorageError> {
        let pool_config = PoolConfig::from_url(config.effective_url());
        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut conn = pool
            .get()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl StorageBackend for RedisBackend {
    async fn reserve(&self, group: &str, id: &str) -> Result<(), StorageError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let key = render_lock_key(group, id);

        // SETNX=false means the key already exists: the lock is already
        // held, so reserving again is a no-op (idempotent Reserve). The
        // per-group count can briefly lead the key index during Reserve
        // and lag during Release, since group-set membership is only
        // updated when the key insert actually created something.
        let created: bool = conn
            .set_nx(&key, chrono::Utc::now().timestamp())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        if created {
            let _: i64 = conn
                .sadd(group, &key)
                .await
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        Ok(())
    }

    async fn get_locks(&self, group: &str) -> Result<usize, StorageError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let count: i64 = conn
            .scard(group)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    async fn release(&self, group: &str, id: &str) -> Result<(), StorageError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let key = render_lock_key(group, id);

        let _: i64 = conn
            .del(&key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let _: i64 = conn
            .srem(group, &key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn has_lock(&self, group: &str, id: &str) -> Result<bool, StorageError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let key = render_lock_key(group, id);
        let exists: bool = conn
            .exists(&key)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(exists)
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close();
        Ok(())
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration_tests {
    use super::*;

    fn test_config() -> RedisConfig {
        RedisConfig {
            url: std::env::var("FLEETLOCK_TEST_REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            ..RedisConfig::default()
        }
    }

    #[tokio::test]
    async fn conformance() {
        let backend = RedisBackend::new(&test_config()).await.unwrap();
        fleetlock_state::testing::run_backend_conformance_tests(&backend)
            .await
            .unwrap();
    }
}
