use std::time::Duration;

/// Configuration for the Redis storage backend.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g. `redis://127.0.0.1:6379`).
    ///
    /// Use `rediss://` scheme for TLS connections. When `tls_enabled` is
    /// set, the URL scheme is automatically upgraded to `rediss://`.
    pub url: String,

    /// Number of connections in the `deadpool-redis` pool.
    pub pool_size: usize,

    /// Timeout for acquiring a pooled connection.
    pub connection_timeout: Duration,

    /// Whether TLS is enabled.
    pub tls_enabled: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://127.0.0.1:6379"),
            pool_size: 10,
            connection_timeout: Duration::from_secs(5),
            tls_enabled: false,
        }
    }
}

impl RedisConfig {
    /// Return the effective connection URL, upgrading to `rediss://` when
    /// TLS is enabled.
    #[must_use]
    pub fn effective_url(&self) -> String {
        if self.tls_enabled && self.url.starts_with("redis://") {
            self.url.replacen("redis://", "rediss://", 1)
        } else {
            self.url.clone()
        }
    }
}

/// Render the per-lock key for `(group, id)`: `group:<g>,id:<id>`.
#[must_use]
pub fn render_lock_key(group: &str, id: &str) -> String {
    format!("group:{group},id:{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = RedisConfig::default();
        assert_eq!(cfg.url, "redis://127.0.0.1:6379");
        assert_eq!(cfg.pool_size, 10);
        assert_eq!(cfg.connection_timeout, Duration::from_secs(5));
    }

    #[test]
    fn tls_upgrades_scheme() {
        let cfg = RedisConfig {
            tls_enabled: true,
            ..RedisConfig::default()
        };
        assert_eq!(cfg.effective_url(), "rediss://127.0.0.1:6379");
    }

    #[test]
    fn lock_key_format() {
        assert_eq!(render_lock_key("default", "u1"), "group:default,id:u1");
    }
}
