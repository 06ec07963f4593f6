//! The bit-level cryptographic primitives the rest of the crate is
//! built on: SHA-256, HMAC-SHA256/HKDF, ChaCha20, Poly1305, the
//! combined ChaCha20-Poly1305 AEAD, and MODP-2048 Diffie-Hellman.
//!
//! Every primitive here is value-in/value-out and carries no state
//! across calls; `handshake` and `tunnel` are the only modules that
//! hold mutable session state.

pub mod aead;
pub mod chacha20;
pub mod dh;
pub mod hmac_hkdf;
pub mod poly1305;
pub mod sha256;
