//! The Reboot Coordinator: glues the Lock Manager and Cluster
//! Client into the two request flows the HTTP boundary serves. Carries no
//! HTTP types of its own so it stays testable without a server running.

mod metrics;
mod outcome;

pub use metrics::{CoordinatorMetrics, MetricsSnapshot};
pub use outcome::{ReleaseOutcome, ReserveOutcome};

use std::sync::Arc;

use fleetlock_cluster::ClusterClient;
use fleetlock_manager::LockManager;

/// Coordinates a reservation with the optional cluster drain/uncordon
/// dance. With no [`ClusterClient`] configured, reserve/release degrade
/// to plain lock-manager calls.
pub struct RebootCoordinator {
    manager: LockManager,
    cluster: Option<ClusterClient>,
    metrics: Arc<CoordinatorMetrics>,
}

impl RebootCoordinator {
    #[must_use]
    pub fn new(manager: LockManager, cluster: Option<ClusterClient>) -> Self {
        Self { manager, cluster, metrics: Arc::new(CoordinatorMetrics::default()) }
    }

    /// Point-in-time snapshot of reservation/drain counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Drive the reserve flow for `/v1/pre-reboot`.
    pub async fn reserve(&self, group: &str, id: &str) -> ReserveOutcome {
        let reserved = match self.manager.reserve(group, id).await {
            Ok(reserved) => reserved,
            Err(err) => {
                tracing::error!(%group, %id, error = %err, "reserve failed");
                return ReserveOutcome::Error;
            }
        };
        if !reserved {
            return ReserveOutcome::AllSlotsFull;
        }

        let Some(cluster) = &self.cluster else {
            self.metrics.increment_reservations_granted();
            return ReserveOutcome::Success;
        };

        let node = match cluster.find_node_by_app_id(id).await {
            Ok(node) => node,
            Err(err) => {
                tracing::error!(%group, %id, error = %err, "node lookup failed");
                return ReserveOutcome::Error;
            }
        };

        let Some(node) = node else {
            // No matching node: not a clustered agent, treat as reserved.
            self.metrics.increment_reservations_granted();
            return ReserveOutcome::Success;
        };

        match cluster.is_drained(&node).await {
            Ok(true) => {
                self.metrics.increment_reservations_granted();
                return ReserveOutcome::Success;
            }
            Ok(false) => {}
            Err(err) => {
                tracing::error!(%group, %id, %node, error = %err, "drain-state check failed");
                return ReserveOutcome::Error;
            }
        }

        let cluster = cluster.clone();
        let node_for_task = node.clone();
        self.metrics.increment_drains_started();
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            match cluster.drain_node(&node_for_task).await {
                Ok(()) => {
                    metrics.increment_drains_completed();
                    tracing::info!(node = %node_for_task, "node drained");
                }
                Err(err) => {
                    metrics.increment_drains_failed();
                    tracing::warn!(node = %node_for_task, error = %err, "node drain did not complete");
                }
            }
        });

        self.metrics.increment_reservations_granted();
        ReserveOutcome::WaitingForNodeDrain
    }

    /// Drive the release flow for `/v1/steady-state`.
    pub async fn release(&self, group: &str, id: &str) -> ReleaseOutcome {
        if let Some(cluster) = &self.cluster {
            match cluster.find_node_by_app_id(id).await {
                Ok(Some(node)) => {
                    if let Err(err) = cluster.uncordon_node(&node).await {
                        tracing::error!(%group, %id, %node, error = %err, "uncordon failed");
                        return ReleaseOutcome::Error;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::error!(%group, %id, error = %err, "node lookup failed");
                    return ReleaseOutcome::Error;
                }
            }
        }

        match self.manager.release(group, id).await {
            Ok(()) => {
                self.metrics.increment_releases();
                ReleaseOutcome::Success
            }
            Err(err) => {
                tracing::error!(%group, %id, error = %err, "release failed");
                ReleaseOutcome::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetlock_core::{GroupConfig, Groups};
    use fleetlock_state_memory::MemoryBackend;

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
    async fn reserve_without_cluster_succeeds_immediately() {
        let coordinator = RebootCoordinator::new(manager_with(single_slot_group()), None);
        assert_eq!(
            coordinator.reserve("default", "u1").await,
            ReserveOutcome::Success
        );
    }

    #[tokio::test]
    async fn reserve_reports_all_slots_full() {
        let coordinator = RebootCoordinator::new(manager_with(single_slot_group()), None);
        assert_eq!(
            coordinator.reserve("default", "u1").await,
            ReserveOutcome::Success
        );
        assert_eq!(
            coordinator.reserve("default", "u2").await,
            ReserveOutcome::AllSlotsFull
        );
    }

    #[tokio::test]
    async fn reserve_reports_unknown_group_as_error() {
        let coordinator = RebootCoordinator::new(manager_with(single_slot_group()), None);
        assert_eq!(
            coordinator.reserve("nope", "u1").await,
            ReserveOutcome::Error
        );
    }

    #[tokio::test]
    async fn release_without_cluster_delegates_to_manager() {
        let coordinator = RebootCoordinator::new(manager_with(single_slot_group()), None);
        assert_eq!(
            coordinator.reserve("default", "u1").await,
            ReserveOutcome::Success
        );
        assert_eq!(
            coordinator.release("default", "u1").await,
            ReleaseOutcome::Success
        );
        assert_eq!(
            coordinator.reserve("default", "u2").await,
            ReserveOutcome::Success
        );
    }

    #[tokio::test]
    async fn metrics_track_reservations_and_releases() {
        let coordinator = RebootCoordinator::new(manager_with(single_slot_group()), None);
        coordinator.reserve("default", "u1").await;
        coordinator.release("default", "u1").await;

        let snap = coordinator.metrics();
        assert_eq!(snap.reservations_granted, 1);
        assert_eq!(snap.releases, 1);
        assert_eq!(snap.drains_started, 0);
    }
}
