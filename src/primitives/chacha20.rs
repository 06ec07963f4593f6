//! ChaCha20 stream cipher, RFC 7539 / RFC 8439.
//!
//! Block function + keystream XOR only; there is no incremental
//! `Cipher`-style object because every caller in this crate encrypts
//! or decrypts one buffer at a time.

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
const BLOCK_LEN: usize = 64;
const CONSTANTS: [u32; 4] = [0x6170_7865, 0x3320_646e, 0x7962_2d32, 0x6b20_6574];

/// One 64-byte ChaCha20 block for `counter`.
fn block(key: &[u8; KEY_LEN], nonce: &[u8; NONCE_LEN], counter: u32) -> [u8; BLOCK_LEN] {
    let mut state = [0u32; 16];
    state[0..4].copy_from_slice(&CONSTANTS);
    for i in 0..8 {
        state[4 + i] = u32::from_le_bytes(key[i * 4..i * 4 + 4].try_into().unwrap());
    }
    state[12] = counter;
    for i in 0..3 {
        state[13 + i] = u32::from_le_bytes(nonce[i * 4..i * 4 + 4].try_into().unwrap());
    }

    let initial = state;
    for _ in 0..10 {
        quarter_round(&mut state, 0, 4, 8, 12);
        quarter_round(&mut state, 1, 5, 9, 13);
        quarter_round(&mut state, 2, 6, 10, 14);
        quarter_round(&mut state, 3, 7, 11, 15);
        quarter_round(&mut state, 0, 5, 10, 15);
        quarter_round(&mut state, 1, 6, 11, 12);
        quarter_round(&mut state, 2, 7, 8, 13);
        quarter_round(&mut state, 3, 4, 9, 14);
    }

    let mut out = [0u8; BLOCK_LEN];
    for i in 0..16 {
        let word = state[i].wrapping_add(initial[i]);
        out[i * 4..i * 4 + 4].copy_from_slice(&word.to_le_bytes());
    }
    out
}

fn quarter_round(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize) {
    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(16);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(12);

    state[a] = state[a].wrapping_add(state[b]);
    state[d] ^= state[a];
    state[d] = state[d].rotate_left(8);

    state[c] = state[c].wrapping_add(state[d]);
    state[b] ^= state[c];
    state[b] = state[b].rotate_left(7);
}

/// XOR `data` with the ChaCha20 keystream starting at block `counter`.
/// Encryption and decryption are the same operation.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `key` is not 32 bytes or
/// `nonce` is not 12 bytes.
pub fn chacha20_xor(key: &[u8], nonce: &[u8], counter: u32, data: &[u8]) -> Result<Vec<u8>> {
    let key: &[u8; KEY_LEN] = key
        .try_into()
        .map_err(|_| Error::InvalidArgument(format!("ChaCha20 key must be {KEY_LEN} bytes")))?;
    let nonce: &[u8; NONCE_LEN] = nonce.try_into().map_err(|_| {
        Error::InvalidArgument(format!("ChaCha20 nonce must be {NONCE_LEN} bytes"))
    })?;

    let mut out = Vec::with_capacity(data.len());
    for (i, chunk) in data.chunks(BLOCK_LEN).enumerate() {
        let keystream = block(
            key,
            nonce,
            counter
                .checked_add(i as u32)
                .ok_or_else(|| Error::InvalidArgument("ChaCha20 block counter overflow".into()))?,
        );
        for (byte, ks) in chunk.iter().zip(keystream.iter()) {
            out.push(byte ^ ks);
        }
    }
    Ok(out)
}
