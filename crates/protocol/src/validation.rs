//! Request validation pipeline: short-circuits at the first
//! failing step, checking header, body, group, then id in that order.

use fleetlock_core::is_valid_group_name;

use crate::responses::{
    empty_id, invalid_group_value, missing_fleetlock_header, request_parse_failed,
};
use crate::wire::{ClientParams, FleetLockRequest, ResponseEnvelope};

/// A validation failure, carrying the exact response envelope to send.
#[derive(Debug)]
pub enum ValidationFailure {
    MissingHeader(ResponseEnvelope),
    ParseFailed(ResponseEnvelope),
    InvalidGroup(ResponseEnvelope),
    EmptyId(ResponseEnvelope),
}

impl ValidationFailure {
    #[must_use]
    pub fn into_envelope(self) -> ResponseEnvelope {
        match self {
            Self::MissingHeader(e)
            | Self::ParseFailed(e)
            | Self::InvalidGroup(e)
            | Self::EmptyId(e) => e,
        }
    }
}

/// Step 1: the `fleet-lock-protocol` header must be `true`, case
/// insensitively.
#[must_use]
pub fn header_is_valid(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

/// Run the full validation pipeline against a raw header value and JSON
/// body, returning the validated [`ClientParams`] or the first failing
/// step.
///
/// # Errors
///
/// Returns [`ValidationFailure`] describing which validation step failed.
pub fn validate_request(
    fleet_lock_protocol_header: Option<&str>,
    body: &[u8],
) -> Result<ClientParams, ValidationFailure> {
    if !header_is_valid(fleet_lock_protocol_header) {
        return Err(ValidationFailure::MissingHeader(missing_fleetlock_header()));
    }

    let parsed: FleetLockRequest = serde_json::from_slice(body)
        .map_err(|_| ValidationFailure::ParseFailed(request_parse_failed()))?;
    let params = parsed.client_params;

    if !is_valid_group_name(&params.group) {
        return Err(ValidationFailure::InvalidGroup(invalid_group_value()));
    }

    if params.id.is_empty() {
        return Err(ValidationFailure::EmptyId(empty_id()));
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_check_is_case_insensitive() {
        assert!(header_is_valid(Some("true")));
        assert!(header_is_valid(Some("TRUE")));
        assert!(header_is_valid(Some("True")));
        assert!(!header_is_valid(Some("false")));
        assert!(!header_is_valid(None));
    }

    fn body(id: &str, group: &str) -> Vec<u8> {
        serde_json::json!({ "client_params": { "id": id, "group": group } })
            .to_string()
            .into_bytes()
    }

    #[test]
    fn missing_header_short_circuits() {
        let err = validate_request(None, &body("u1", "default")).unwrap_err();
        assert!(matches!(err, ValidationFailure::MissingHeader(_)));
    }

    #[test]
    fn unparsable_body_is_rejected() {
        let err = validate_request(Some("true"), b"not json").unwrap_err();
        assert!(matches!(err, ValidationFailure::ParseFailed(_)));
    }

    #[test]
    fn invalid_group_is_rejected() {
        let err = validate_request(Some("true"), &body("u1", "bad group!")).unwrap_err();
        assert!(matches!(err, ValidationFailure::InvalidGroup(_)));
    }

    #[test]
    fn group_with_newline_is_rejected() {
        let err = validate_request(Some("true"), &body("u1", "default\n")).unwrap_err();
        assert!(matches!(err, ValidationFailure::InvalidGroup(_)));
    }

    #[test]
    fn empty_id_is_rejected() {
        let err = validate_request(Some("true"), &body("", "default")).unwrap_err();
        assert!(matches!(err, ValidationFailure::EmptyId(_)));
    }

    #[test]
    fn valid_request_passes() {
        let params = validate_request(Some("true"), &body("u1", "default")).unwrap();
        assert_eq!(params.id, "u1");
        assert_eq!(params.group, "default");
    }
}
