//! Handlers for `/v1/pre-reboot` and `/v1/steady-state`: method check, header check, body parse, group/id validation, then
//! the reserve/release flow.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use fleetlock_coordinator::{ReleaseOutcome, ReserveOutcome};
use fleetlock_protocol::{responses, validate_request, ValidationFailure};

use super::AppState;

fn envelope_response(status: StatusCode, envelope: fleetlock_protocol::ResponseEnvelope) -> Response {
    (status, Json(envelope)).into_response()
}

/// Any path not recognized by the router. Matches `msgNotFound`.
pub async fn not_found() -> Response {
    envelope_response(StatusCode::NOT_FOUND, responses::not_found())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// `POST /v1/pre-reboot`: reserve a slot, optionally draining the node.
pub async fn pre_reboot(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return envelope_response(StatusCode::METHOD_NOT_ALLOWED, responses::wrong_method());
    }

    let params = match validate_request(header_value(&headers, "fleet-lock-protocol"), &body) {
        Ok(params) => params,
        Err(failure) => return validation_failure_response(failure),
    };

    match state.coordinator.reserve(&params.group, &params.id).await {
        ReserveOutcome::Success => envelope_response(StatusCode::OK, responses::success()),
        ReserveOutcome::AllSlotsFull => {
            envelope_response(StatusCode::LOCKED, responses::all_slots_full())
        }
        ReserveOutcome::WaitingForNodeDrain => {
            envelope_response(StatusCode::ACCEPTED, responses::waiting_for_node_drain())
        }
        ReserveOutcome::Error => {
            envelope_response(StatusCode::INTERNAL_SERVER_ERROR, responses::unexpected_error())
        }
    }
}

/// `POST /v1/steady-state`: release a slot, optionally uncordoning the node.
pub async fn steady_state(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return envelope_response(StatusCode::METHOD_NOT_ALLOWED, responses::wrong_method());
    }

    let params = match validate_request(header_value(&headers, "fleet-lock-protocol"), &body) {
        Ok(params) => params,
        Err(failure) => return validation_failure_response(failure),
    };

    match state.coordinator.release(&params.group, &params.id).await {
        ReleaseOutcome::Success => envelope_response(StatusCode::OK, responses::success()),
        ReleaseOutcome::Error => {
            envelope_response(StatusCode::INTERNAL_SERVER_ERROR, responses::unexpected_error())
        }
    }
}

fn validation_failure_response(failure: ValidationFailure) -> Response {
    envelope_response(StatusCode::BAD_REQUEST, failure.into_envelope())
}
