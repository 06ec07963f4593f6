//! Fixed-group Diffie-Hellman, RFC 3526 Group 14 (2048-bit MODP).
//!
//! `BigUint::modpow` is not constant-time; the private exponent is
//! 256 bits, far shorter than `p`, so this module trades full
//! side-channel resistance for a simple implementation (see
//! DESIGN.md). The public side and the shared-secret computation are
//! this crate's only hot paths that touch 2048-bit arithmetic.

use num_bigint::BigUint;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretBox};

use crate::error::{Error, Result};

/// Serialized length of a public value / shared secret, in bytes.
pub const ELEMENT_LEN: usize = 256;
/// Private exponent length, in bytes (256 bits).
const PRIVATE_LEN: usize = 32;

#[rustfmt::skip]
const P_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD129",
    "024E088A67CC74020BBEA63B139B22514A08798E3404DDEF95",
    "19B3CD3A431B302B0A6DF25F14374FE1356D6D51C245E485B5",
    "76625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7EDEE386BFB",
    "5A899FA5AE9F24117C4B1FE649286651ECE45B3DC2007CB8A1",
    "63BF0598DA48361C55D39A69163FA8FD24CF5F83655D23DCA3",
    "AD961C62F356208552BB9ED529077096966D670C354E4ABC98",
    "04F1746C08CA18217C32905E462E36CE3BE39E772C180E8603",
    "9B2783A2EC07A28FB5C55DF06F4C52C9DE2BCBF69558171839",
    "95497CEA956AE515D2261898FA051015728E5A8AACAA68FFFF",
    "FFFFFFFFFFFF",
);

fn group_order() -> BigUint {
    BigUint::parse_bytes(P_HEX.as_bytes(), 16).expect("hard-coded MODP-2048 prime is valid hex")
}

fn generator() -> BigUint {
    BigUint::from(2u8)
}

/// A generated DH keypair. `private` is a 256-bit exponent wrapped to
/// be zeroized on drop; `public` is `g^private mod p`, 256 bytes
/// big-endian.
pub struct Keypair {
    pub private: SecretBox<[u8; PRIVATE_LEN]>,
    pub public: [u8; ELEMENT_LEN],
}

fn to_fixed_be(value: &BigUint, len: usize) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    let mut out = vec![0u8; len];
    out[len - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Recompute the public component `g^private mod p` from a known
/// private exponent.
#[must_use]
pub fn public_from_private(private: &[u8; PRIVATE_LEN]) -> [u8; ELEMENT_LEN] {
    let priv_int = BigUint::from_bytes_be(private);
    let pub_int = generator().modpow(&priv_int, &group_order());
    to_fixed_be(&pub_int, ELEMENT_LEN)
        .try_into()
        .expect("modpow result is always < p, which fits in ELEMENT_LEN bytes")
}

/// Generate a fresh DH keypair using the given CSPRNG.
///
/// # Errors
///
/// This never fails in practice (the RNG is infallible on supported
/// platforms); the `Result` exists to let callers propagate
/// [`Error::RngFailure`] uniformly with the rest of the handshake.
pub fn generate_keypair<R: RngCore + ?Sized>(rng: &mut R) -> Result<Keypair> {
    let mut private = [0u8; PRIVATE_LEN];
    rng.fill_bytes(&mut private);
    let public = public_from_private(&private);
    Ok(Keypair {
        private: SecretBox::new(Box::new(private)),
        public,
    })
}

/// Recreate a keypair from a known private exponent (deterministic
/// test fixtures / the canonical end-to-end scenario in §8).
#[must_use]
pub fn keypair_from_private(private: [u8; PRIVATE_LEN]) -> Keypair {
    let public = public_from_private(&private);
    Keypair {
        private: SecretBox::new(Box::new(private)),
        public,
    }
}

/// `peer_public^private mod p`, serialized as exactly
/// [`ELEMENT_LEN`] bytes, big-endian, zero-padded on the left.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if `peer_public` is not
/// [`ELEMENT_LEN`] bytes.
pub fn derive_shared(peer_public: &[u8], private: &SecretBox<[u8; PRIVATE_LEN]>) -> Result<[u8; ELEMENT_LEN]> {
    if peer_public.len() != ELEMENT_LEN {
        return Err(Error::InvalidArgument(format!(
            "DH public value must be {ELEMENT_LEN} bytes"
        )));
    }
    let peer_int = BigUint::from_bytes_be(peer_public);
    let priv_int = BigUint::from_bytes_be(private.expose_secret());
    let shared = peer_int.modpow(&priv_int, &group_order());
    Ok(to_fixed_be(&shared, ELEMENT_LEN)
        .try_into()
        .expect("modpow result is always < p, which fits in ELEMENT_LEN bytes"))
}
