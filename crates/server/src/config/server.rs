use serde::Deserialize;

use super::TlsConfig;

fn default_shutdown_timeout_seconds() -> u64 {
    30
}

/// HTTP server bind configuration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// `<host>:<port>` to bind to. Unset defaults to `0.0.0.0:8080`, or
    /// `0.0.0.0:8443` when `ssl.enabled` is set.
    #[serde(default)]
    pub listen: Option<String>,

    #[serde(default)]
    pub ssl: TlsConfig,

    /// Maximum time to wait for in-flight requests during shutdown.
    #[serde(default = "default_shutdown_timeout_seconds")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: None,
            ssl: TlsConfig::default(),
            shutdown_timeout_seconds: default_shutdown_timeout_seconds(),
        }
    }
}

impl ServerConfig {
    /// Resolve the bind address, applying the ssl-aware default.
    #[must_use]
    pub fn effective_listen(&self) -> &str {
        self.listen.as_deref().unwrap_or(if self.ssl.enabled {
            "0.0.0.0:8443"
        } else {
            "0.0.0.0:8080"
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listen_is_plain_http_port() {
        let config = ServerConfig::default();
        assert_eq!(config.effective_listen(), "0.0.0.0:8080");
    }

    #[test]
    fn ssl_enabled_switches_default_port() {
        let config = ServerConfig {
            ssl: TlsConfig {
                enabled: true,
                ..TlsConfig::default()
            },
            ..ServerConfig::default()
        };
        assert_eq!(config.effective_listen(), "0.0.0.0:8443");
    }

    #[test]
    fn explicit_listen_overrides_default() {
        let config = ServerConfig {
            listen: Some("127.0.0.1:9090".to_owned()),
            ..ServerConfig::default()
        };
        assert_eq!(config.effective_listen(), "127.0.0.1:9090");
    }
}
