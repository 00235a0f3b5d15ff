use thiserror::Error;

/// Errors raised by the Cluster Client.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    #[error(transparent)]
    Lease(#[from] fleetlock_state_kubernetes::LeaseError),

    #[error("invalid machine id: {0}")]
    AppId(#[from] fleetlock_core::appid::AppIdError),

    #[error("failed to evict all pods from node")]
    FailedToEvictAllPods,

    #[error("drain timed out before completing")]
    DeadlineExceeded,
}
