//! Poly1305 one-time authenticator, RFC 7539 §2.5.
//!
//! The 130-bit accumulator is carried in a [`num_bigint::BigUint`]
//! rather than hand-rolled 26-bit limbs (see DESIGN.md); the RFC
//! vector below is bit-exact either way.

use num_bigint::BigUint;

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const TAG_LEN: usize = 16;

const CLAMP_MASK_HEX: &str = "0ffffffc0ffffffc0ffffffc0fffffff";

fn prime() -> BigUint {
    (BigUint::from(1u8) << 130) - BigUint::from(5u8)
}

fn clamp(r: BigUint) -> BigUint {
    let mask = BigUint::parse_bytes(CLAMP_MASK_HEX.as_bytes(), 16)
        .expect("hard-coded clamp mask is valid hex");
    r & mask
}

/// Compute the 16-byte Poly1305 tag of `msg` under the one-time `key`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `key` is not 32 bytes.
pub fn poly1305_mac(key: &[u8], msg: &[u8]) -> Result<[u8; TAG_LEN]> {
    if key.len() != KEY_LEN {
        return Err(Error::InvalidArgument(format!(
            "Poly1305 key must be {KEY_LEN} bytes"
        )));
    }

    let mut r_bytes = key[..16].to_vec();
    r_bytes.reverse(); // little-endian -> big-endian for BigUint::from_bytes_be
    let r = clamp(BigUint::from_bytes_be(&r_bytes));

    let mut s_bytes = key[16..].to_vec();
    s_bytes.reverse();
    let s = BigUint::from_bytes_be(&s_bytes);

    let p = prime();
    let mut accumulator = BigUint::from(0u8);

    for block in msg.chunks(16) {
        let mut n_bytes = block.to_vec();
        n_bytes.push(0x01);
        n_bytes.reverse();
        let n = BigUint::from_bytes_be(&n_bytes);

        accumulator = (accumulator + n) % &p;
        accumulator = (accumulator * &r) % &p;
    }

    let tag = (accumulator + s) % (BigUint::from(1u8) << 128);
    let tag_be = tag.to_bytes_be();

    let mut out = [0u8; TAG_LEN];
    // `to_bytes_be` drops leading zeros; right-align into the fixed
    // big-endian buffer, then reverse to little-endian wire order.
    out[TAG_LEN - tag_be.len()..].copy_from_slice(&tag_be);
    out.reverse();
    Ok(out)
}
