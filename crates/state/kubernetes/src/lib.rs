//! Kubernetes-backed storage: the coordination-store [`StorageBackend`]
//! (reservation leases) and the drain lease state machine consumed by
//! the Cluster Client. Both live here because both are built on
//! the same `coordination.k8s.io/v1` `Lease` primitive against the `kube`
//! client.

pub mod backend;
pub mod client;
pub mod config;
pub mod lease;

pub use backend::KubernetesBackend;
pub use config::KubernetesStateConfig;
pub use lease::{DrainLease, LeaseError, LeaseState};
