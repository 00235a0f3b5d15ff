//! Pure-function app-id derivation: given a machine id and a fixed
//! application id, both 32 hex characters, derive a UUIDv4-shaped app-id
//! the agent uses to identify itself to the server.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// The fleet-specific application id FleetLock agents derive their app-id
/// from.
pub const FLEET_APP_ID: &str = "de35106b6ec24688b63afddaa156679b";

#[derive(Debug, Error)]
pub enum AppIdError {
    #[error("invalid hex input: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("HMAC key of invalid length")]
    InvalidKeyLength,
}

/// Derive an app-id from a machine id and an application id.
///
/// `machine_id` may contain `-` separators (as `/etc/machine-id`-derived
/// ids sometimes do by convention elsewhere); they are stripped before
/// decoding. `app_id` is expected to already be plain hex (no separators),
/// matching [`FLEET_APP_ID`].
pub fn derive(machine_id: &str, app_id: &str) -> Result<String, AppIdError> {
    let machine_id: String = machine_id.chars().filter(|&c| c != '-').collect();
    let key = hex::decode(machine_id)?;
    let msg = hex::decode(app_id)?;

    let mut mac = HmacSha256::new_from_slice(&key).map_err(|_| AppIdError::InvalidKeyLength)?;
    mac.update(&msg);
    let sum = mac.finalize().into_bytes();

    let mut uuid_bytes = [0u8; 16];
    uuid_bytes.copy_from_slice(&sum[..16]);
    uuid_bytes[6] = (uuid_bytes[6] & 0x0F) | 0x40;
    uuid_bytes[8] = (uuid_bytes[8] & 0x3F) | 0x80;

    Ok(hex::encode(uuid_bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_id_derivation_table() {
        let cases = [
            (
                "dfd7882acda64c34aca76193c46f5d4e",
                "35ba2101ae3f4d45b96e9c51f461bbff",
            ),
            (
                "37974b3f7dc54f949209b4fd5b3c5704",
                "f59c4fa7d80e406f83993d64abf922e3",
            ),
            (
                "4473d601f9234ff2a84617c3eaeeea35",
                "7742030900754495bfeb49c7d1f4d653",
            ),
        ];

        for (machine_id, expected) in cases {
            let got = derive(machine_id, FLEET_APP_ID).expect("derivation should succeed");
            assert_eq!(got, expected, "mismatch for machine id {machine_id}");
        }
    }

    #[test]
    fn non_hex_input_is_an_error() {
        assert!(derive("not-hex-at-all-zz", FLEET_APP_ID).is_err());
    }

    #[test]
    fn dashes_in_machine_id_are_stripped() {
        let plain = derive("dfd7882acda64c34aca76193c46f5d4e", FLEET_APP_ID).unwrap();
        let dashed = derive("dfd7882a-cda6-4c34-aca7-6193c46f5d4e", FLEET_APP_ID).unwrap();
        assert_eq!(plain, dashed);
    }
}
