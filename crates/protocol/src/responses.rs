//! Response envelope constructors for the `kind`/`value` wire wording.

use crate::wire::ResponseEnvelope;

pub const GROUP_VALIDATION_PATTERN: &str = "^[a-zA-Z0-9.-]+$";

#[must_use]
pub fn not_found() -> ResponseEnvelope {
    ResponseEnvelope::new(
        "not_found",
        "The requested url is not found on this server",
    )
}

#[must_use]
pub fn wrong_method() -> ResponseEnvelope {
    ResponseEnvelope::new("bad_request", "Only accepts POST request")
}

#[must_use]
pub fn missing_fleetlock_header() -> ResponseEnvelope {
    ResponseEnvelope::new(
        "missing_fleetlock_header",
        "The header fleet-lock-protocol must be set to true",
    )
}

#[must_use]
pub fn request_parse_failed() -> ResponseEnvelope {
    ResponseEnvelope::new("bad_request", "The request json could not be parsed")
}

#[must_use]
pub fn invalid_group_value() -> ResponseEnvelope {
    ResponseEnvelope::new(
        "bad_request",
        format!(
            "The value of group is invalid or empty. It must conform to \"{GROUP_VALIDATION_PATTERN}\""
        ),
    )
}

#[must_use]
pub fn empty_id() -> ResponseEnvelope {
    ResponseEnvelope::new("bad_request", "The value of id is empty")
}

#[must_use]
pub fn unexpected_error() -> ResponseEnvelope {
    ResponseEnvelope::new("error", "An unexpected error occured")
}

#[must_use]
pub fn success() -> ResponseEnvelope {
    ResponseEnvelope::new("success", "The operation was succesfull")
}

#[must_use]
pub fn all_slots_full() -> ResponseEnvelope {
    ResponseEnvelope::new(
        "all_slots_full",
        "Could not reserve a slot as all slots in the group are currently locked already",
    )
}

#[must_use]
pub fn waiting_for_node_drain() -> ResponseEnvelope {
    ResponseEnvelope::new(
        "waiting_for_node_drain",
        "The Slot has been reserved, but the node is not yet drained",
    )
}
