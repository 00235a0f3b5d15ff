use serde::Deserialize;

/// Inbound TLS configuration. `cert`/`key` are
/// required when `enabled` is set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TlsConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Path to the PEM certificate chain.
    #[serde(default)]
    pub cert: Option<String>,

    /// Path to the PEM private key.
    #[serde(default)]
    pub key: Option<String>,
}

impl TlsConfig {
    /// Validate that `cert`/`key` are present whenever TLS is enabled.
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && (self.cert.is_none() || self.key.is_none()) {
            return Err("server.ssl.cert and server.ssl.key are required when ssl.enabled is set".to_owned());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_is_always_valid() {
        assert!(TlsConfig::default().validate().is_ok());
    }

    #[test]
    fn enabled_without_cert_or_key_is_invalid() {
        let config = TlsConfig {
            enabled: true,
            ..TlsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn enabled_with_cert_and_key_is_valid() {
        let config = TlsConfig {
            enabled: true,
            cert: Some("cert.pem".to_owned()),
            key: Some("key.pem".to_owned()),
        };
        assert!(config.validate().is_ok());
    }
}
