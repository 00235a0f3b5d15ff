mod server;
mod storage;
mod tls;

pub use server::ServerConfig;
pub use storage::StorageConfig;
pub use tls::TlsConfig;

use serde::Deserialize;

use fleetlock_cluster::ClusterConfig;
use fleetlock_core::{Groups, default_groups};

fn default_log_level() -> String {
    "info".to_owned()
}

/// Top-level configuration for `fleetlock-server`, loaded from a single
/// YAML document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// `debug` | `info` | `warn` | `error`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerConfig,

    /// Absent entirely when the server is not cluster-aware.
    #[serde(default)]
    pub kubernetes: Option<ClusterConfig>,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default = "default_groups")]
    pub groups: Groups,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerConfig::default(),
            kubernetes: None,
            storage: StorageConfig::default(),
            groups: default_groups(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.server.effective_listen(), "0.0.0.0:8080");
        assert!(config.kubernetes.is_none());
        assert_eq!(config.groups.len(), 1);
    }

    #[test]
    fn parses_a_full_document() {
        let yaml = "
logLevel: debug
server:
  listen: \"127.0.0.1:9090\"
kubernetes:
  kubeconfig: /etc/fleetlock/kubeconfig
  drainTimeoutSeconds: 120
  drainRetries: 3
storage:
  type: sqlite
  sqlite:
    file: /var/lib/fleetlock/fleetlock.db
groups:
  default:
    slots: 2
  canary:
    slots: 1
";
        let config: Config = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.log_level, "debug");
        let kubernetes = config.kubernetes.unwrap();
        assert_eq!(kubernetes.drain_timeout_seconds, 120);
        assert_eq!(kubernetes.drain_retries, 3);
        assert_eq!(config.groups["canary"].slots, 1);
    }
}
