//! Handshake message encode/decode: JSON, UTF-8, hex-encoded fields.
//!
//! The handshake is bandwidth-insignificant; debuggability outweighs
//! compactness here, unlike the record layer's compact binary
//! framing (see `tunnel`).

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::handshake::{HelloMessage, NONCE_LEN, Role};
use crate::primitives::dh::ELEMENT_LEN;

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(rename = "pub")]
    public: String,
    nonce: String,
    mac: String,
}

/// Serialize a [`HelloMessage`] to its wire form (JSON bytes).
#[must_use]
pub fn encode(msg: &HelloMessage) -> Vec<u8> {
    let wire = WireMessage {
        role: msg.role.as_str().to_string(),
        public: hex::encode(msg.public),
        nonce: hex::encode(msg.nonce),
        mac: hex::encode(msg.mac),
    };
    serde_json::to_vec(&wire).expect("HelloMessage fields always serialize to valid JSON")
}

fn decode_hex_field<const N: usize>(value: &str, field: &str) -> Result<[u8; N]> {
    if value.len() != 2 * N {
        return Err(Error::TransportError(format!(
            "handshake field '{field}' must be {expected} hex chars, got {actual}",
            expected = 2 * N,
            actual = value.len()
        )));
    }
    let bytes = hex::decode(value)
        .map_err(|e| Error::TransportError(format!("handshake field '{field}' is not valid hex: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| Error::TransportError(format!("handshake field '{field}' has unexpected length")))
}

/// Parse a [`HelloMessage`] from its wire form.
///
/// Field lengths are checked exactly: `pub` must decode to exactly
/// [`ELEMENT_LEN`] bytes with leading zeros preserved (a decoder that
/// stripped them before hex-decoding would corrupt small public
/// values — see DESIGN.md).
///
/// # Errors
///
/// Returns [`Error::TransportError`] if the message is not valid
/// JSON, is missing a field, or a field has the wrong length/role.
pub fn decode(bytes: &[u8]) -> Result<HelloMessage> {
    let wire: WireMessage = serde_json::from_slice(bytes)
        .map_err(|e| Error::TransportError(format!("malformed handshake message: {e}")))?;

    let role = Role::parse(&wire.role)?;
    let public: [u8; ELEMENT_LEN] = decode_hex_field(&wire.public, "pub")?;
    let nonce: [u8; NONCE_LEN] = decode_hex_field(&wire.nonce, "nonce")?;
    let mac: [u8; 32] = decode_hex_field(&wire.mac, "mac")?;

    Ok(HelloMessage {
        role,
        public,
        nonce,
        mac,
    })
}
