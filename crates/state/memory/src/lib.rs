//! Process-local [`StorageBackend`] backed by [`DashMap`].
//!
//! Groups are pre-created at construction (all group names must be known
//! up front) and never added to afterwards. Suitable only for
//! single-replica deployments — there is no cross-process coordination
//! here, the Lock Manager's per-group read-write lock is the only
//! synchronization this backend relies on.

use async_trait::async_trait;
use dashmap::DashMap;
use fleetlock_core::{Lock, StorageError};
use fleetlock_state::StorageBackend;

const INITIAL_SLOT_CAPACITY: usize = 10;

/// In-memory [`StorageBackend`]. Construct with the full set of group names
/// known at startup; reserving into an unknown group is an error.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    groups: DashMap<String, Vec<Lock>>,
}

impl MemoryBackend {
    /// Create a backend pre-populated with empty slot lists for each of
    /// `group_names`.
    #[must_use]
    pub fn new(group_names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let groups = DashMap::new();
        for name in group_names {
            groups.insert(name.into(), Vec::with_capacity(INITIAL_SLOT_CAPACITY));
        }
        Self { groups }
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn reserve(&self, group: &str, id: &str) -> Result<(), StorageError> {
        let mut slots = self
            .groups
            .get_mut(group)
            .ok_or_else(|| StorageError::Backend(format!("unknown group: {group}")))?;

        if slots.iter().any(|lock| lock.id == id) {
            return Ok(());
        }
        slots.push(Lock::new(group, id));
        Ok(())
    }

    async fn get_locks(&self, group: &str) -> Result<usize, StorageError> {
        Ok(self.groups.get(group).map_or(0, |slots| slots.len()))
    }

    async fn release(&self, group: &str, id: &str) -> Result<(), StorageError> {
        let Some(mut slots) = self.groups.get_mut(group) else {
            return Ok(());
        };
        if let Some(pos) = slots.iter().position(|lock| lock.id == id) {
            slots.swap_remove(pos);
        }
        Ok(())
    }

    async fn has_lock(&self, group: &str, id: &str) -> Result<bool, StorageError> {
        let slots = self
            .groups
            .get(group)
            .ok_or_else(|| StorageError::Backend(format!("unknown group: {group}")))?;
        Ok(slots.iter().any(|lock| lock.id == id))
    }

    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetlock_state::testing::run_backend_conformance_tests;

    fn backend() -> MemoryBackend {
        MemoryBackend::new(["default", "multi"])
    }

    #[tokio::test]
    async fn conformance() {
        let backend = backend();
        run_backend_conformance_tests(&backend).await.unwrap();
    }

    #[tokio::test]
    async fn reserve_into_unknown_group_errors() {
        let backend = backend();
        let err = backend.reserve("nope", "u1").await.unwrap_err();
        assert!(matches!(err, StorageError::Backend(_)));
    }

    #[tokio::test]
    async fn release_unknown_group_is_not_an_error() {
        let backend = backend();
        backend.release("nope", "u1").await.unwrap();
    }

    #[tokio::test]
    async fn get_locks_unknown_group_is_zero() {
        let backend = backend();
        assert_eq!(backend.get_locks("nope").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn get_stale_locks_is_not_implemented() {
        let backend = backend();
        let err = backend
            .get_stale_locks(std::time::Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotImplemented));
    }
}
