//! Domain types, error taxonomy and app-id derivation shared by every
//! fleetlock-rs crate.

pub mod appid;
pub mod error;
pub mod types;

pub use error::{LockError, StorageError};
pub use types::{default_groups, is_valid_group_name, validate_groups, GroupConfig, Groups, Lock};
