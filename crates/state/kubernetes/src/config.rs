use serde::{Deserialize, Serialize};

/// Configuration for the coordination-store (Kubernetes `Lease`) storage
/// backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KubernetesStateConfig {
    /// Namespace to create reservation leases in. Defaults to the
    /// in-cluster service-account namespace, or `fleetlock` outside a
    /// cluster.
    #[serde(default)]
    pub namespace: Option<String>,
}
