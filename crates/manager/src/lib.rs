//! The Lock Manager: per-group capacity enforcement over a
//! pluggable [`StorageBackend`], using double-checked locking to reduce
//! wasted backend round-trips while leaving the backend as the real
//! serialization point across replicas.

use std::collections::HashMap;

use tokio::sync::RwLock;

use fleetlock_core::{GroupConfig, Groups, LockError};
use fleetlock_state::StorageBackend;

struct LockGroup {
    config: GroupConfig,
    lock: RwLock<()>,
}

/// Multi-group reservation engine. Holds one read-write lock per group and
/// delegates actual slot accounting to a [`StorageBackend`].
pub struct LockManager {
    groups: HashMap<String, LockGroup>,
    storage: Box<dyn StorageBackend>,
}

impl LockManager {
    /// Build a manager over `groups` and a pre-constructed `storage`
    /// backend. `groups` is validated by the caller before construction.
    #[must_use]
    pub fn new(groups: &Groups, storage: Box<dyn StorageBackend>) -> Self {
        let groups = groups
            .iter()
            .map(|(name, cfg)| {
                (
                    name.clone(),
                    LockGroup {
                        config: *cfg,
                        lock: RwLock::new(()),
                    },
                )
            })
            .collect();
        Self { groups, storage }
    }

    /// Reserve a slot for `id` in `group`.
    ///
    /// Idempotent: if `(group, id)` already holds a slot, returns
    /// `Ok(true)` without creating a duplicate. Returns `Ok(false)` when
    /// the group is at capacity.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::UnknownGroup`]/[`LockError::EmptyId`] on
    /// validation failure, or [`LockError::Backend`] if the storage
    /// backend fails.
    pub async fn reserve(&self, group: &str, id: &str) -> Result<bool, LockError> {
        let lgroup = self
            .groups
            .get(group)
            .ok_or_else(|| LockError::UnknownGroup(group.to_string()))?;
        if id.is_empty() {
            return Err(LockError::EmptyId);
        }

        {
            let _guard = lgroup.lock.read().await;
            if self.storage.has_lock(group, id).await? {
                return Ok(true);
            }
            if !self.check_slots(group, &lgroup.config).await? {
                return Ok(false);
            }
        }

        let _guard = lgroup.lock.write().await;
        // Re-check: another writer may have filled the last slot between
        // the read-locked check above and acquiring the write lock.
        if !self.check_slots(group, &lgroup.config).await? {
            return Ok(false);
        }
        self.storage.reserve(group, id).await?;
        Ok(true)
    }

    async fn check_slots(&self, group: &str, config: &GroupConfig) -> Result<bool, LockError> {
        let used = self.storage.get_locks(group).await?;
        Ok(used < config.slots)
    }

    /// Release the slot held by `id` in `group`. Idempotent:
    /// releasing an unheld `(group, id)` is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::UnknownGroup`]/[`LockError::EmptyId`] on
    /// validation failure, or [`LockError::Backend`] if the storage
    /// backend fails.
    pub async fn release(&self, group: &str, id: &str) -> Result<(), LockError> {
        let lgroup = self
            .groups
            .get(group)
            .ok_or_else(|| LockError::UnknownGroup(group.to_string()))?;
        if id.is_empty() {
            return Err(LockError::EmptyId);
        }

        let _guard = lgroup.lock.write().await;
        self.storage.release(group, id).await?;
        Ok(())
    }

    /// Finalize the underlying storage backend's connections.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Backend`] if the storage backend fails to
    /// close cleanly.
    pub async fn close(&self) -> Result<(), LockError> {
        self.storage.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetlock_state_memory::MemoryBackend;
    use std::sync::Arc;

    fn manager_with(groups: Groups) -> LockManager {
        let names: Vec<_> = groups.keys().cloned().collect();
        LockManager::new(&groups, Box::new(MemoryBackend::new(names)))
    }

    fn single_slot_group() -> Groups {
        let mut g = Groups::new();
        g.insert("default".to_string(), GroupConfig { slots: 1 });
        g
    }

    #[tokio::test]
    async fn reserve_then_full_then_release_then_reserve() {
        let lm = manager_with(single_slot_group());

        assert!(lm.reserve("default", "u1").await.unwrap());
        assert!(!lm.reserve("default", "u2").await.unwrap());

        lm.release("default", "u1").await.unwrap();
        assert!(lm.reserve("default", "u2").await.unwrap());
    }

    #[tokio::test]
    async fn reserve_is_idempotent() {
        let lm = manager_with(single_slot_group());

        assert!(lm.reserve("default", "u1").await.unwrap());
        assert!(lm.reserve("default", "u1").await.unwrap());
    }

    #[tokio::test]
    async fn release_unheld_is_not_an_error() {
        let lm = manager_with(single_slot_group());
        lm.release("default", "never-held").await.unwrap();
    }

    #[tokio::test]
    async fn unknown_group_is_a_validation_error() {
        let lm = manager_with(single_slot_group());
        assert!(matches!(
            lm.reserve("nope", "u1").await,
            Err(LockError::UnknownGroup(_))
        ));
        assert!(matches!(
            lm.release("nope", "u1").await,
            Err(LockError::UnknownGroup(_))
        ));
    }

    #[tokio::test]
    async fn empty_id_is_a_validation_error() {
        let lm = manager_with(single_slot_group());
        assert!(matches!(
            lm.reserve("default", "").await,
            Err(LockError::EmptyId)
        ));
    }

    #[tokio::test]
    async fn exactly_n_succeed_for_n_slots_under_concurrency() {
        let mut g = Groups::new();
        g.insert("multi".to_string(), GroupConfig { slots: 3 });
        let lm = Arc::new(manager_with(g));

        let mut handles = Vec::new();
        for i in 0..10 {
            let lm = Arc::clone(&lm);
            handles.push(tokio::spawn(async move {
                lm.reserve("multi", &format!("u{i}")).await.unwrap()
            }));
        }

        let mut succeeded = 0;
        for h in handles {
            if h.await.unwrap() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 3);
    }
}
