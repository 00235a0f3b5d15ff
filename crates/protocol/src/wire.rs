use serde::{Deserialize, Serialize};

/// The `client_params` object sent in every FleetLock request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientParams {
    pub id: String,
    pub group: String,
}

/// A raw, not-yet-validated FleetLock request body.
#[derive(Debug, Deserialize)]
pub struct FleetLockRequest {
    pub client_params: ClientParams,
}

/// The response envelope returned on every request: HTTP status
/// signals success/failure, `kind`/`value` are diagnostic only.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub kind: String,
    pub value: String,
}

impl ResponseEnvelope {
    #[must_use]
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
        }
    }
}
