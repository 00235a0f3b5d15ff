//! Coordination-store [`StorageBackend`]: one `coordination.k8s.io/v1`
//! `Lease` per reservation, keyed `fleetlock-reservation-<group>-<N>`.
//! Kubernetes object names must be lowercase DNS labels, so group
//! names are lowercased at this boundary — this is asymmetric with the
//! group table (which preserves case) and must be applied consistently
//! here to avoid reservations escaping capacity accounting.

use async_trait::async_trait;
use k8s_openapi::api::coordination::v1::{Lease, LeaseSpec};
use kube::api::{ListParams, ObjectMeta, PostParams};
use kube::{Api, Client};

use fleetlock_core::StorageError;
use fleetlock_state::StorageBackend;

use crate::client::resolve_namespace;

fn reservation_prefix(group: &str) -> String {
    format!("fleetlock-reservation-{}-", group.to_lowercase())
}

/// Parse the trailing integer suffix of a reservation lease name, given the
/// group's key prefix. Returns `None` for names that don't match
/// `<prefix><digits>`.
fn suffix(name: &str, prefix: &str) -> Option<u64> {
    let rest = name.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Coordination-store [`StorageBackend`] backed by Kubernetes `Lease`
/// objects.
pub struct KubernetesBackend {
    client: Api<Lease>,
}

impl KubernetesBackend {
    /// Build a backend against the given namespace (or the in-cluster /
    /// fallback namespace when `namespace` is `None`).
    #[must_use]
    pub fn new(client: Client, namespace: Option<&str>) -> Self {
        let ns = resolve_namespace(namespace);
        Self {
            client: Api::namespaced(client, &ns),
        }
    }

    async fn leases_for_group(&self, group: &str) -> Result<Vec<Lease>, StorageError> {
        let prefix = reservation_prefix(group);
        let all = self
            .client
            .list(&ListParams::default())
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(all
            .items
            .into_iter()
            .filter(|lease| {
                lease
                    .metadata
                    .name
                    .as_deref()
                    .is_some_and(|name| suffix(name, &prefix).is_some())
            })
            .collect())
    }
}

#[async_trait]
impl StorageBackend for KubernetesBackend {
    async fn reserve(&self, group: &str, id: &str) -> Result<(), StorageError> {
        let leases = self.leases_for_group(group).await?;

        let mut used = Vec::with_capacity(leases.len());
        let prefix = reservation_prefix(group);
        for lease in &leases {
            if lease.spec.as_ref().and_then(|s| s.holder_identity.as_deref()) == Some(id) {
                return Ok(());
            }
            if let Some(name) = lease.metadata.name.as_deref() {
                if let Some(n) = suffix(name, &prefix) {
                    used.push(n);
                }
            }
        }

        let mut n = 0u64;
        while used.contains(&n) {
            n += 1;
        }
        let name = format!("{prefix}{n}");

        let lease = Lease {
            metadata: ObjectMeta {
                name: Some(name),
                ..Default::default()
            },
            spec: Some(LeaseSpec {
                holder_identity: Some(id.to_string()),
                ..Default::default()
            }),
        };

        self.client
            .create(&PostParams::default(), &lease)
            .await
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn get_locks(&self, group: &str) -> Result<usize, StorageError> {
        Ok(self.leases_for_group(group).await?.len())
    }

    async fn release(&self, group: &str, id: &str) -> Result<(), StorageError> {
        let leases = self.leases_for_group(group).await?;
        for lease in leases {
            if lease.spec.as_ref().and_then(|s| s.holder_identity.as_deref()) == Some(id) {
                if let Some(name) = lease.metadata.name.as_deref() {
                    self.client
                        .delete(name, &kube::api::DeleteParams::default())
                        .await
                        .map_err(|e| StorageError::Backend(e.to_string()))?;
                }
                break;
            }
        }
        Ok(())
    }

    async fn has_lock(&self, group: &str, id: &str) -> Result<bool, StorageError> {
        let leases = self.leases_for_group(group).await?;
        Ok(leases
            .iter()
            .any(|l| l.spec.as_ref().and_then(|s| s.holder_identity.as_deref()) == Some(id)))
    }

    async fn close(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_parses_trailing_digits() {
        let prefix = reservation_prefix("default");
        assert_eq!(suffix("fleetlock-reservation-default-0", &prefix), Some(0));
        assert_eq!(
            suffix("fleetlock-reservation-default-12", &prefix),
            Some(12)
        );
    }

    #[test]
    fn suffix_rejects_non_digit_or_other_group() {
        let prefix = reservation_prefix("default");
        assert_eq!(suffix("fleetlock-reservation-other-0", &prefix), None);
        assert_eq!(suffix("fleetlock-reservation-default-x", &prefix), None);
        assert_eq!(suffix("fleetlock-reservation-default-", &prefix), None);
    }

    #[test]
    fn group_names_are_lowercased_in_the_key() {
        assert_eq!(
            reservation_prefix("Web-Fleet"),
            "fleetlock-reservation-web-fleet-"
        );
    }
}
