//! AEAD_CHACHA20_POLY1305, RFC 7539 §2.8.

use subtle::ConstantTimeEq;

use super::chacha20::chacha20_xor;
use super::poly1305::{TAG_LEN, poly1305_mac};
use crate::error::{Error, Result};

/// `(ciphertext, tag)`.
pub type Sealed = (Vec<u8>, [u8; TAG_LEN]);

fn poly_key(key: &[u8], nonce: &[u8]) -> Result<Vec<u8>> {
    let zeros = [0u8; 64];
    let block = chacha20_xor(key, nonce, 0, &zeros)?;
    Ok(block[..32].to_vec())
}

fn pad16(len: usize) -> usize {
    (16 - len % 16) % 16
}

fn mac_input(aad: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut input = Vec::with_capacity(aad.len() + ciphertext.len() + 32);
    input.extend_from_slice(aad);
    input.extend(std::iter::repeat_n(0u8, pad16(aad.len())));
    input.extend_from_slice(ciphertext);
    input.extend(std::iter::repeat_n(0u8, pad16(ciphertext.len())));
    input.extend_from_slice(&(aad.len() as u64).to_le_bytes());
    input.extend_from_slice(&(ciphertext.len() as u64).to_le_bytes());
    input
}

/// Encrypt `plaintext` under `key`/`nonce`, authenticating `aad`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `key`/`nonce` have the wrong
/// length (see [`super::chacha20::chacha20_xor`]).
pub fn seal(key: &[u8], nonce: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Sealed> {
    let poly_key = poly_key(key, nonce)?;
    let ciphertext = chacha20_xor(key, nonce, 1, plaintext)?;
    let tag = poly1305_mac(&poly_key, &mac_input(aad, &ciphertext))?;
    Ok((ciphertext, tag))
}

/// Verify `tag` over `aad ‖ ciphertext` and, on success, decrypt.
///
/// # Errors
///
/// Returns [`Error::AuthenticationFailed`] on tag mismatch (no
/// plaintext is returned) or [`Error::InvalidArgument`] on malformed
/// key/nonce lengths.
pub fn open(key: &[u8], nonce: &[u8], ciphertext: &[u8], aad: &[u8], tag: &[u8]) -> Result<Vec<u8>> {
    let poly_key = poly_key(key, nonce)?;
    let expected = poly1305_mac(&poly_key, &mac_input(aad, ciphertext))?;

    if expected.ct_eq(tag).unwrap_u8() != 1 {
        return Err(Error::AuthenticationFailed);
    }

    chacha20_xor(key, nonce, 1, ciphertext)
}
