use thiserror::Error;

use fleetlock_core::{LockError, StorageError};

/// Errors fatal at startup: surfaced as `Fatal: <msg>` on stderr, exit
/// code 1.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown storage type: {0}")]
    UnknownStorageType(String),

    #[error("unknown log level \"{0}\", expected one of: debug, info, warn, error")]
    UnknownLogLevel(String),

    #[error("storage backend error: {0}")]
    Storage(#[from] StorageError),

    #[error("lock manager error: {0}")]
    Lock(#[from] LockError),

    #[error("kubernetes client error: {0}")]
    Kube(#[from] kube::Error),

    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("tls error: {0}")]
    Tls(String),
}
