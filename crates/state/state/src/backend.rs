use std::time::Duration;

use async_trait::async_trait;
use fleetlock_core::{Lock, StorageError};

/// The narrow interface the Lock Manager consumes.
///
/// It is assumed that each group itself is multi-reader, single-writer —
/// the Lock Manager serializes writers per group via its own read-write
/// lock and the backend does not need its own per-group locking on
/// top of that, only linearizability for concurrent `Reserve` calls across
/// replicas (typically via a unique-key insert at the storage layer).
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Reserve a lock for `id` in `group`. Idempotent: reserving a slot
    /// already held by `id` succeeds without creating a duplicate.
    async fn reserve(&self, group: &str, id: &str) -> Result<(), StorageError>;

    /// Count of locks currently held in `group`.
    async fn get_locks(&self, group: &str) -> Result<usize, StorageError>;

    /// Release the lock held by `id` in `group`. Idempotent: releasing a
    /// non-existent `(group, id)` is not an error.
    async fn release(&self, group: &str, id: &str) -> Result<(), StorageError>;

    /// Whether `id` already holds a slot in `group`.
    async fn has_lock(&self, group: &str, id: &str) -> Result<bool, StorageError>;

    /// Finalize any connections held by this backend.
    async fn close(&self) -> Result<(), StorageError>;

    /// Return all locks older than `age`. Optional: backends MAY signal
    /// not-implemented rather than provide this.
    async fn get_stale_locks(&self, _age: Duration) -> Result<Vec<Lock>, StorageError> {
        Err(StorageError::NotImplemented)
    }
}
