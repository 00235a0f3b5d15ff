use serde::Deserialize;

fn default_drain_timeout_seconds() -> u32 {
    300
}

/// Configuration for the Cluster Client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfig {
    /// Path to a kubeconfig file. Empty uses in-cluster config.
    #[serde(default)]
    pub kubeconfig: Option<String>,

    /// Namespace reservation and drain leases are created in. Defaults to
    /// the in-cluster service-account namespace.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Deadline for a single `DrainNode` call, in seconds.
    #[serde(default = "default_drain_timeout_seconds")]
    pub drain_timeout_seconds: u32,

    /// Number of drain failures before `IsDrained` circuit-breaks and
    /// treats the node as drained regardless of lease state. `0` disables
    /// the circuit breaker.
    #[serde(default)]
    pub drain_retries: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            namespace: None,
            drain_timeout_seconds: default_drain_timeout_seconds(),
            drain_retries: 0,
        }
    }
}
