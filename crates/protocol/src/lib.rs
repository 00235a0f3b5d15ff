//! FleetLock wire protocol types and request validation.

pub mod responses;
pub mod utils;
pub mod validation;
pub mod wire;

pub use responses::GROUP_VALIDATION_PATTERN;
pub use utils::read_user_ip;
pub use validation::{ValidationFailure, header_is_valid, validate_request};
pub use wire::{ClientParams, FleetLockRequest, ResponseEnvelope};
