//! Namespace resolution shared by the coordination-store backend and the
//! drain lease store: both live inside the cluster's `coordination.k8s.io`
//! API and need to know which namespace to address.

use std::path::Path;

/// Namespace fallback used outside a cluster (dev/test) when the
/// service-account namespace file is absent.
const FALLBACK_NAMESPACE: &str = "fleetlock";

const SERVICE_ACCOUNT_NAMESPACE_FILE: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

/// Resolve the namespace to operate in: read the in-cluster service-account
/// namespace file, or fall back to [`FALLBACK_NAMESPACE`] when running
/// outside a cluster.
#[must_use]
pub fn resolve_namespace(explicit: Option<&str>) -> String {
    if let Some(ns) = explicit.filter(|s| !s.is_empty()) {
        return ns.to_string();
    }

    match std::fs::read_to_string(Path::new(SERVICE_ACCOUNT_NAMESPACE_FILE)) {
        Ok(contents) if !contents.trim().is_empty() => contents.trim().to_string(),
        _ => FALLBACK_NAMESPACE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_namespace_wins() {
        assert_eq!(resolve_namespace(Some("custom")), "custom");
    }

    #[test]
    fn empty_explicit_falls_back() {
        assert_eq!(resolve_namespace(Some("")), FALLBACK_NAMESPACE);
    }

    #[test]
    fn missing_file_falls_back() {
        assert_eq!(resolve_namespace(None), FALLBACK_NAMESPACE);
    }
}
