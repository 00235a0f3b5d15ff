//! The Cluster Client: node lookup by app-id, the drain lease
//! state machine, the pod-eviction drain loop, and uncordon.

use std::time::{Duration, Instant};

use k8s_openapi::api::core::v1::{Node, Pod};
use kube::api::{DeleteParams, EvictParams, ListParams, Patch, PatchParams};
use kube::{Api, Client};

use fleetlock_core::appid::{self, FLEET_APP_ID};
use fleetlock_state_kubernetes::DrainLease;

use crate::error::ClusterError;

const FIELD_MANAGER: &str = "fleetlock-rs";
const MIRROR_POD_ANNOTATION: &str = "kubernetes.io/config.mirror";

/// Client against the cluster control plane implementing node lookup,
/// draining and uncordon. Cheap to clone: the underlying `kube::Client`
/// is reference-counted.
#[derive(Clone)]
pub struct ClusterClient {
    client: Client,
    namespace: Option<String>,
    drain_timeout_seconds: u32,
    drain_retries: u32,
}

impl ClusterClient {
    #[must_use]
    pub fn new(
        client: Client,
        namespace: Option<String>,
        drain_timeout_seconds: u32,
        drain_retries: u32,
    ) -> Self {
        Self {
            client,
            namespace,
            drain_timeout_seconds,
            drain_retries,
        }
    }

    fn lease(&self, node: &str) -> DrainLease {
        DrainLease::new(self.client.clone(), self.namespace.as_deref(), node)
    }

    /// Find the node whose machine-id-derived app-id matches `app_id`.
    /// Returns `Ok(None)` when no node matches.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Kube`] if the node list cannot be fetched,
    /// or [`ClusterError::AppId`] if a node's machine id is malformed hex.
    pub async fn find_node_by_app_id(&self, app_id: &str) -> Result<Option<String>, ClusterError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&ListParams::default()).await?;

        for node in list.items {
            let Some(machine_id) = node
                .status
                .as_ref()
                .and_then(|s| s.node_info.as_ref())
                .map(|ni| ni.machine_id.as_str())
            else {
                continue;
            };

            let derived = appid::derive(machine_id, FLEET_APP_ID)?;
            if derived == app_id {
                let name = node.metadata.name.unwrap_or_default();
                tracing::info!(node = %name, %app_id, "matched node by app-id");
                return Ok(Some(name));
            }
        }

        Ok(None)
    }

    /// Drain `node`: acquire the drain lease, cordon, evict all
    /// non-mirror, non-`DaemonSet` pods, then mark the lease `done` or
    /// `error`. At most one error is returned; partial eviction
    /// failures coalesce into [`ClusterError::FailedToEvictAllPods`].
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Lease`] if the lease is locked or invalid,
    /// [`ClusterError::Kube`] for cordon/list failures,
    /// [`ClusterError::FailedToEvictAllPods`] if any eviction failed, or
    /// [`ClusterError::DeadlineExceeded`] if `drain_timeout_seconds`
    /// elapses mid-drain.
    pub async fn drain_node(&self, node: &str) -> Result<(), ClusterError> {
        let lease = self.lease(node);
        lease.lock(i32::try_from(self.drain_timeout_seconds).unwrap_or(i32::MAX))
            .await?;

        let deadline = Instant::now() + Duration::from_secs(u64::from(self.drain_timeout_seconds));
        let result = self.drain_node_inner(node, deadline).await;

        match &result {
            Ok(()) => {
                if let Err(e) = lease.done().await {
                    tracing::error!(%node, error = %e, "failed to mark drain lease done");
                }
            }
            Err(e) => {
                tracing::error!(%node, error = %e, "drain failed");
                if let Err(e2) = lease.error().await {
                    tracing::error!(%node, error = %e2, "failed to set drain lease to error state");
                }
            }
        }
        result
    }

    async fn drain_node_inner(&self, node: &str, deadline: Instant) -> Result<(), ClusterError> {
        self.cordon(node, true).await?;

        let pods: Api<Pod> = Api::all(self.client.clone());
        let list = pods
            .list(&ListParams::default().fields(&format!("spec.nodeName={node}")))
            .await?;

        let mut any_eviction_failed = false;
        for pod in list.items {
            if pod
                .metadata
                .annotations
                .as_ref()
                .is_some_and(|a| a.contains_key(MIRROR_POD_ANNOTATION))
            {
                continue;
            }
            if is_daemonset_owned(&pod) {
                continue;
            }

            if Instant::now() >= deadline {
                return Err(ClusterError::DeadlineExceeded);
            }

            let name = pod.metadata.name.clone().unwrap_or_default();
            let namespace = pod.metadata.namespace.clone().unwrap_or_default();
            let grace = pod
                .spec
                .as_ref()
                .and_then(|s| s.termination_grace_period_seconds);

            let pod_api: Api<Pod> = Api::namespaced(self.client.clone(), &namespace);
            let mut delete_options = DeleteParams::default();
            delete_options.grace_period_seconds = grace.map(|g| u32::try_from(g).unwrap_or(0));
            let evict_params = EvictParams {
                delete_options: Some(delete_options),
                ..Default::default()
            };

            let remaining = deadline.saturating_duration_since(Instant::now());
            match tokio::time::timeout(remaining, pod_api.evict(&name, &evict_params)).await {
                Ok(Ok(())) => {
                    tracing::info!(%node, pod = %name, %namespace, "evicted pod");
                }
                Ok(Err(e)) => {
                    tracing::warn!(%node, pod = %name, %namespace, error = %e, "failed to evict pod");
                    any_eviction_failed = true;
                }
                Err(_elapsed) => {
                    tracing::error!(%node, "aborting node drain, deadline exceeded");
                    return Err(ClusterError::DeadlineExceeded);
                }
            }
        }

        if any_eviction_failed {
            Err(ClusterError::FailedToEvictAllPods)
        } else {
            Ok(())
        }
    }

    /// Whether `node` has finished draining: a `done` lease, or the
    /// drain-retry circuit breaker has tripped.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Lease`] if the lease cannot be read.
    pub async fn is_drained(&self, node: &str) -> Result<bool, ClusterError> {
        let lease = self.lease(node);
        if lease.is_done().await? {
            return Ok(true);
        }

        let fails = lease.fail_count().await?;
        if fails == 0 {
            return Ok(false);
        }

        if self.drain_retries > 0 && fails >= self.drain_retries {
            tracing::info!(
                %node,
                fails,
                max_retries = self.drain_retries,
                "exhausted retries for draining node, marking as drained"
            );
            return Ok(true);
        }
        Ok(false)
    }

    /// Uncordon `node` and delete its drain lease (missing lease is not an
    /// error).
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Kube`] if the uncordon patch fails, or
    /// [`ClusterError::Lease`] if the lease cannot be deleted.
    pub async fn uncordon_node(&self, node: &str) -> Result<(), ClusterError> {
        self.cordon(node, false).await?;
        self.lease(node).delete().await?;
        Ok(())
    }

    async fn cordon(&self, node: &str, unschedulable: bool) -> Result<(), ClusterError> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let patch = serde_json::json!({ "spec": { "unschedulable": unschedulable } });
        nodes
            .patch(node, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(patch))
            .await?;
        Ok(())
    }
}

fn is_daemonset_owned(pod: &Pod) -> bool {
    pod.metadata
        .owner_references
        .as_ref()
        .is_some_and(|refs| refs.iter().any(|r| r.kind == "DaemonSet"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
    use std::collections::BTreeMap;

    fn pod_with_owner_kind(kind: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                owner_references: Some(vec![OwnerReference {
                    kind: kind.to_string(),
                    ..Default::default()
                }]),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn daemonset_owned_pods_are_skipped() {
        assert!(is_daemonset_owned(&pod_with_owner_kind("DaemonSet")));
        assert!(!is_daemonset_owned(&pod_with_owner_kind("ReplicaSet")));
        assert!(!is_daemonset_owned(&Pod::default()));
    }

    #[test]
    fn mirror_pod_annotation_is_detected() {
        let mut annotations = BTreeMap::new();
        annotations.insert(MIRROR_POD_ANNOTATION.to_string(), "true".to_string());
        let pod = Pod {
            metadata: ObjectMeta {
                annotations: Some(annotations),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(
            pod.metadata
                .annotations
                .as_ref()
                .is_some_and(|a| a.contains_key(MIRROR_POD_ANNOTATION))
        );
    }
}
