//! Selects and constructs a [`StorageBackend`] from `storage:` config,
//! mirroring `acteon-server`'s `create_state` factory pattern.

use fleetlock_state::StorageBackend;
use fleetlock_state_kubernetes::KubernetesBackend;
use fleetlock_state_memory::MemoryBackend;
use fleetlock_state_redis::{RedisBackend, RedisConfig};
use fleetlock_state_sql::{MySqlBackend, MySqlConfig, PostgresBackend, PostgresConfig, SqliteBackend, SqliteConfig};

use crate::config::StorageConfig;
use crate::error::ServerError;

/// Build the configured storage backend.
///
/// `group_names` seeds the memory backend's per-group map; other backends
/// discover groups lazily from storage content.
///
/// # Errors
///
/// Returns [`ServerError::UnknownStorageType`] for an unrecognized `type`,
/// [`ServerError::Config`] for a selected type missing its config block, or
/// [`ServerError::Storage`] if the backend fails to initialize.
pub async fn create_storage_backend(
    config: &StorageConfig,
    group_names: &[String],
    kube_client: Option<kube::Client>,
    kube_namespace: Option<&str>,
) -> Result<Box<dyn StorageBackend>, ServerError> {
    match config.kind.as_str() {
        "memory" => Ok(Box::new(MemoryBackend::new(group_names.to_vec()))),

        "sqlite" => {
            let cfg = config
                .sqlite
                .as_ref()
                .ok_or_else(|| ServerError::Config("storage.sqlite block is required for type: sqlite".into()))?;
            let backend = SqliteBackend::new(&SqliteConfig {
                file: cfg.file.clone(),
            })
            .await?;
            Ok(Box::new(backend))
        }

        "postgres" => {
            let cfg = config.postgres.as_ref().ok_or_else(|| {
                ServerError::Config("storage.postgres block is required for type: postgres".into())
            })?;
            let backend = PostgresBackend::new(&PostgresConfig {
                address: cfg.address.clone(),
                username: cfg.username.clone(),
                password: cfg.password.clone(),
                database: cfg.database.clone(),
                options: cfg.options.clone(),
                pool_size: cfg.pool_size,
            })
            .await?;
            Ok(Box::new(backend))
        }

        "mysql" => {
            let cfg = config
                .mysql
                .as_ref()
                .ok_or_else(|| ServerError::Config("storage.mysql block is required for type: mysql".into()))?;
            let backend = MySqlBackend::new(&MySqlConfig {
                address: cfg.address.clone(),
                username: cfg.username.clone(),
                password: cfg.password.clone(),
                database: cfg.database.clone(),
                options: cfg.options.clone(),
                pool_size: cfg.pool_size,
            })
            .await?;
            Ok(Box::new(backend))
        }

        "kv" => {
            let cfg = config
                .redis
                .as_ref()
                .ok_or_else(|| ServerError::Config("storage.redis block is required for type: kv".into()))?;
            let backend = RedisBackend::new(&RedisConfig {
                url: cfg.address.clone(),
                pool_size: cfg.pool_size,
                connection_timeout: cfg.connection_timeout(),
                tls_enabled: cfg.tls_enabled,
            })
            .await?;
            Ok(Box::new(backend))
        }

        "kubernetes" => {
            let client = kube_client.ok_or_else(|| {
                ServerError::Config("storage.type: kubernetes requires the kubernetes: section".into())
            })?;
            Ok(Box::new(KubernetesBackend::new(client, kube_namespace)))
        }

        other => Err(ServerError::UnknownStorageType(other.to_owned())),
    }
}
