//! `rustls` certificate loading and the manual TLS accept loop used when
//! `server.ssl.enabled` is set.

use std::fs;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};

use crate::config::TlsConfig;
use crate::error::ServerError;

fn load_certs(path: &str) -> Result<Vec<CertificateDer<'static>>, ServerError> {
    let file = fs::File::open(Path::new(path))?;
    let mut reader = BufReader::new(file);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ServerError::Tls(format!("failed to read certs from {path}: {e}")))?;
    if certs.is_empty() {
        return Err(ServerError::Tls(format!("no certificates found in {path}")));
    }
    Ok(certs)
}

fn load_private_key(path: &str) -> Result<PrivateKeyDer<'static>, ServerError> {
    let file = fs::File::open(Path::new(path))?;
    let mut reader = BufReader::new(file);
    for item in rustls_pemfile::read_all(&mut reader) {
        match item {
            Ok(rustls_pemfile::Item::Pkcs1Key(key)) => return Ok(PrivateKeyDer::Pkcs1(key)),
            Ok(rustls_pemfile::Item::Pkcs8Key(key)) => return Ok(PrivateKeyDer::Pkcs8(key)),
            Ok(rustls_pemfile::Item::Sec1Key(key)) => return Ok(PrivateKeyDer::Sec1(key)),
            Ok(_) => {}
            Err(e) => return Err(ServerError::Tls(format!("failed to read key from {path}: {e}"))),
        }
    }
    Err(ServerError::Tls(format!("no private key found in {path}")))
}

/// Build a server-side `rustls::ServerConfig` from `ssl.cert`/`ssl.key`.
/// Caller has already checked `validate()` passed.
pub fn build_server_config(ssl: &TlsConfig) -> Result<Arc<rustls::ServerConfig>, ServerError> {
    let cert_path = ssl
        .cert
        .as_deref()
        .ok_or_else(|| ServerError::Tls("server.ssl.cert is required".into()))?;
    let key_path = ssl
        .key
        .as_deref()
        .ok_or_else(|| ServerError::Tls("server.ssl.key is required".into()))?;

    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| ServerError::Tls(e.to_string()))?;

    Ok(Arc::new(config))
}
