//! Drain lease state machine: a durable per-node coordination
//! record keyed `fleetlock-drain-<node>`, used by the Cluster Client to
//! ensure at most one replica drains a given node at a time.
//!
//! States: `∅ (no record) → draining → {done | error}`. Re-entry into
//! `draining` from `error` or an expired `draining` lease is allowed;
//! expiry-driven re-entry from `draining` increments `failCount`.

use chrono::Utc;
use k8s_openapi::api::coordination::v1::{Lease, LeaseSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::MicroTime;
use kube::api::{DeleteParams, ObjectMeta, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use thiserror::Error;

use crate::client::resolve_namespace;

/// The annotation key `failCount` is stored under.
const FAIL_COUNT_ANNOTATION: &str = "fleetlock.heathcliff26.github.io/fail-count";
const FIELD_MANAGER: &str = "fleetlock-rs";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseState {
    Draining,
    Done,
    Error,
}

impl LeaseState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Draining => "draining",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "draining" => Some(Self::Draining),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Errors raised while operating on a drain lease.
#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("invalid lease: acquireTime, durationSeconds or state is missing")]
    InvalidLease,

    #[error("drain is already locked by another replica")]
    DrainIsLocked,

    #[error("kubernetes api error: {0}")]
    Backend(#[from] kube::Error),
}

fn drain_lease_name(node: &str) -> String {
    format!("fleetlock-drain-{node}")
}

fn fail_count_of(lease: &Lease) -> u32 {
    lease
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(FAIL_COUNT_ANNOTATION))
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// Handle to a single node's drain lease.
pub struct DrainLease {
    name: String,
    client: Api<Lease>,
}

impl DrainLease {
    /// Build a handle for `node`'s drain lease in `namespace` (or the
    /// in-cluster / fallback namespace when `None`).
    #[must_use]
    pub fn new(client: Client, namespace: Option<&str>, node: &str) -> Self {
        let ns = resolve_namespace(namespace);
        Self {
            name: drain_lease_name(node),
            client: Api::namespaced(client, &ns),
        }
    }

    async fn get(&self) -> Result<Option<Lease>, LeaseError> {
        match self.client.get_opt(&self.name).await? {
            Some(lease) => Ok(Some(lease)),
            None => Ok(None),
        }
    }

    /// Attempt to acquire the drain lease for `duration_seconds`.
    ///
    /// Creates the lease if absent. If present and still valid, returns
    /// [`LeaseError::DrainIsLocked`]. If expired, re-enters `draining`,
    /// incrementing `failCount` when the lease was still `draining` at
    /// expiry (a prior drain attempt that never reached `done`/`error`).
    pub async fn lock(&self, duration_seconds: i32) -> Result<(), LeaseError> {
        let Some(lease) = self.get().await? else {
            return self.create(duration_seconds).await;
        };

        let spec = lease.spec.as_ref().ok_or(LeaseError::InvalidLease)?;
        let (Some(acquired), Some(dur), Some(state_str)) = (
            spec.acquire_time.as_ref(),
            spec.lease_duration_seconds,
            spec.holder_identity.as_deref(),
        ) else {
            return Err(LeaseError::InvalidLease);
        };
        let Some(state) = LeaseState::parse(state_str) else {
            return Err(LeaseError::InvalidLease);
        };

        let valid_until = acquired.0 + chrono::Duration::seconds(i64::from(dur));
        if Utc::now() <= valid_until {
            return Err(LeaseError::DrainIsLocked);
        }

        let new_fail_count = if state == LeaseState::Draining {
            fail_count_of(&lease) + 1
        } else {
            fail_count_of(&lease)
        };

        self.update(duration_seconds, LeaseState::Draining, new_fail_count)
            .await
    }

    async fn create(&self, duration_seconds: i32) -> Result<(), LeaseError> {
        let lease = Lease {
            metadata: ObjectMeta {
                name: Some(self.name.clone()),
                ..Default::default()
            },
            spec: Some(LeaseSpec {
                holder_identity: Some(LeaseState::Draining.as_str().to_string()),
                lease_duration_seconds: Some(duration_seconds),
                acquire_time: Some(MicroTime(Utc::now())),
                ..Default::default()
            }),
        };
        self.client.create(&PostParams::default(), &lease).await?;
        Ok(())
    }

    async fn update(
        &self,
        duration_seconds: i32,
        state: LeaseState,
        fail_count: u32,
    ) -> Result<(), LeaseError> {
        let patch = serde_json::json!({
            "metadata": {
                "annotations": { FAIL_COUNT_ANNOTATION: fail_count.to_string() },
            },
            "spec": {
                "holderIdentity": state.as_str(),
                "leaseDurationSeconds": duration_seconds,
                "acquireTime": Utc::now().to_rfc3339(),
            },
        });
        self.client
            .patch(
                &self.name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(patch),
            )
            .await?;
        Ok(())
    }

    /// Mark the lease `done`, preserving `acquireTime`/`failCount`.
    pub async fn done(&self) -> Result<(), LeaseError> {
        let patch = serde_json::json!({
            "spec": { "holderIdentity": LeaseState::Done.as_str() },
        });
        self.client
            .patch(
                &self.name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(patch),
            )
            .await?;
        Ok(())
    }

    /// Mark the lease `error`, incrementing `failCount`.
    pub async fn error(&self) -> Result<(), LeaseError> {
        let fail_count = self
            .get()
            .await?
            .map(|l| fail_count_of(&l) + 1)
            .unwrap_or(1);
        let patch = serde_json::json!({
            "metadata": {
                "annotations": { FAIL_COUNT_ANNOTATION: fail_count.to_string() },
            },
            "spec": { "holderIdentity": LeaseState::Error.as_str() },
        });
        self.client
            .patch(
                &self.name,
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(patch),
            )
            .await?;
        Ok(())
    }

    /// Delete the lease. Missing is not an error.
    pub async fn delete(&self) -> Result<(), LeaseError> {
        match self.client.delete(&self.name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// True iff the lease exists and is `done`. A missing lease is not
    /// considered done.
    pub async fn is_done(&self) -> Result<bool, LeaseError> {
        Ok(self
            .get()
            .await?
            .and_then(|l| l.spec.and_then(|s| s.holder_identity))
            .as_deref()
            == Some(LeaseState::Done.as_str()))
    }

    /// Current `failCount`, or 0 if the lease doesn't exist.
    pub async fn fail_count(&self) -> Result<u32, LeaseError> {
        Ok(self.get().await?.map_or(0, |l| fail_count_of(&l)))
    }

    /// Current state, if the lease exists and is well-formed.
    pub async fn state(&self) -> Result<Option<LeaseState>, LeaseError> {
        Ok(self
            .get()
            .await?
            .and_then(|l| l.spec.and_then(|s| s.holder_identity))
            .and_then(|s| LeaseState::parse(&s)))
    }
}

/// Timestamp accessor used only by tests to avoid depending on Kubernetes.
#[cfg(test)]
pub(crate) fn lease_name_for_test(node: &str) -> String {
    drain_lease_name(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lease_name_format() {
        assert_eq!(drain_lease_name("worker-1"), "fleetlock-drain-worker-1");
        assert_eq!(lease_name_for_test("worker-1"), "fleetlock-drain-worker-1");
    }

    #[test]
    fn state_round_trips() {
        for s in [LeaseState::Draining, LeaseState::Done, LeaseState::Error] {
            assert_eq!(LeaseState::parse(s.as_str()), Some(s));
        }
        assert_eq!(LeaseState::parse("bogus"), None);
    }
}
