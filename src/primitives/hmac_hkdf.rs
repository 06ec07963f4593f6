//! HMAC-SHA256 (RFC 2104) and HKDF (RFC 5869), built on [`sha256`].

use super::sha256::{DIGEST_LEN, sha256};
use crate::error::{Error, Result};

const BLOCK_SIZE: usize = 64;
const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

/// Hash/zero-pad `key` so it fits the HMAC block size.
fn normalize_key(key: &[u8]) -> [u8; BLOCK_SIZE] {
    let mut normalized = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        normalized[..DIGEST_LEN].copy_from_slice(&sha256(key));
    } else {
        normalized[..key.len()].copy_from_slice(key);
    }
    normalized
}

/// `HMAC(K, m) = H((K^opad) || H((K^ipad) || m))`.
#[must_use]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; DIGEST_LEN] {
    let normalized = normalize_key(key);

    let mut ipad_key = [0u8; BLOCK_SIZE];
    let mut opad_key = [0u8; BLOCK_SIZE];
    for i in 0..BLOCK_SIZE {
        ipad_key[i] = normalized[i] ^ IPAD;
        opad_key[i] = normalized[i] ^ OPAD;
    }

    let mut inner_input = Vec::with_capacity(BLOCK_SIZE + data.len());
    inner_input.extend_from_slice(&ipad_key);
    inner_input.extend_from_slice(data);
    let inner = sha256(&inner_input);

    let mut outer_input = Vec::with_capacity(BLOCK_SIZE + DIGEST_LEN);
    outer_input.extend_from_slice(&opad_key);
    outer_input.extend_from_slice(&inner);
    sha256(&outer_input)
}

/// HKDF-Extract (RFC 5869).
///
/// When `salt` is absent, this implementation pads to 64 zero bytes
/// rather than the RFC's `HashLen` (32). This matches the source this
/// protocol was distilled from and changes the resulting PRK; see
/// DESIGN.md. In practice this protocol always supplies the PSK as
/// the salt, so the default only matters to callers of this primitive
/// directly.
#[must_use]
pub fn hkdf_extract(salt: Option<&[u8]>, ikm: &[u8]) -> [u8; DIGEST_LEN] {
    match salt {
        Some(salt) => hmac_sha256(salt, ikm),
        None => hmac_sha256(&[0u8; BLOCK_SIZE], ikm),
    }
}

/// HKDF-Expand (RFC 5869). Fails with [`Error::InvalidArgument`] if
/// `length > 255 * 32`.
pub fn hkdf_expand(prk: &[u8; DIGEST_LEN], info: &[u8], length: usize) -> Result<Vec<u8>> {
    if length > 255 * DIGEST_LEN {
        return Err(Error::InvalidArgument(format!(
            "HKDF-Expand length {length} exceeds 255*HashLen"
        )));
    }

    let mut okm = Vec::with_capacity(length);
    let mut t_prev: Vec<u8> = Vec::new();
    let mut counter: u8 = 1;

    while okm.len() < length {
        let mut input = Vec::with_capacity(t_prev.len() + info.len() + 1);
        input.extend_from_slice(&t_prev);
        input.extend_from_slice(info);
        input.push(counter);

        let t = hmac_sha256(prk, &input);
        okm.extend_from_slice(&t);
        t_prev = t.to_vec();
        counter = counter
            .checked_add(1)
            .expect("length bound above prevents overflow of the RFC 5869 counter");
    }

    okm.truncate(length);
    Ok(okm)
}
