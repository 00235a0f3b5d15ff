use std::time::Duration;

use serde::Deserialize;

fn default_storage_type() -> String {
    "memory".to_owned()
}

fn default_pool_size() -> u32 {
    5
}

/// `storage:`. `type` selects the backend; the matching nested block
/// (named after the underlying technology) supplies its connection
/// details.
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(rename = "type", default = "default_storage_type")]
    pub kind: String,

    #[serde(default)]
    pub sqlite: Option<SqliteStorageConfig>,

    #[serde(default)]
    pub postgres: Option<SqlStorageConfig>,

    #[serde(default)]
    pub mysql: Option<SqlStorageConfig>,

    /// Nested block is named `redis` even though `type: kv` selects it.
    #[serde(default)]
    pub redis: Option<RedisStorageConfig>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: default_storage_type(),
            sqlite: None,
            postgres: None,
            mysql: None,
            redis: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStorageConfig {
    pub file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqlStorageConfig {
    pub address: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub database: String,
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisStorageConfig {
    pub address: String,
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,
    #[serde(default = "default_connection_timeout_seconds")]
    pub connection_timeout_seconds: u64,
    #[serde(default)]
    pub tls_enabled: bool,
}

fn default_connection_timeout_seconds() -> u64 {
    5
}

fn default_redis_pool_size() -> usize {
    10
}

impl RedisStorageConfig {
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }
}
