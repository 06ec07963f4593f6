//! Two-message PSK-authenticated Diffie-Hellman handshake.
//!
//! No retries, no state machine beyond pre-send / post-recv: a
//! [`HandshakeParticipant`] is built, the single `ClientHello` or
//! `ServerHello` exchange runs over a [`Transport`], and
//! [`HandshakeKeys`] drops out the other end. The participant (and
//! its DH private exponent) is discarded immediately after.

use rand::RngCore;
use secrecy::{ExposeSecret, SecretSlice};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::primitives::dh::{self, ELEMENT_LEN};
use crate::primitives::hmac_hkdf::{hkdf_expand, hkdf_extract, hmac_sha256};
use crate::primitives::sha256::sha256;
use crate::transport::Transport;
use crate::wire;

pub const NONCE_LEN: usize = 12;
const OKM_LEN: usize = 128;
/// Handshake messages are small JSON; this is generous headroom over
/// the ~580-byte hex-encoded payload.
const MAX_MESSAGE_LEN: usize = 4096;

/// `"client"` / `"server"`, bound into the transcript MAC so a
/// message cannot be replayed back in the other role.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Role {
    Client,
    Server,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Server => "server",
        }
    }

    pub(crate) fn parse(s: &str) -> Result<Self> {
        match s {
            "client" => Ok(Self::Client),
            "server" => Ok(Self::Server),
            other => Err(Error::TransportError(format!(
                "unknown handshake role '{other}'"
            ))),
        }
    }
}

/// The role-tagged, MAC-authenticated message exchanged once in each
/// direction (`ClientHello` / `ServerHello`).
#[derive(Clone, Debug)]
pub struct HelloMessage {
    pub role: Role,
    pub public: [u8; ELEMENT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub mac: [u8; 32],
}

/// The four directional keys and base nonce both peers derive
/// identically from an honest handshake.
#[derive(Clone)]
pub struct HandshakeKeys {
    pub client_enc: [u8; 32],
    pub server_enc: [u8; 32],
    /// Derived but not consumed by the record layer; reserved.
    pub client_mac: [u8; 32],
    /// Ditto.
    pub server_mac: [u8; 32],
    pub base_nonce: [u8; NONCE_LEN],
}

/// Ephemeral per-session state: PSK, DH keypair, local nonce.
/// Dropped (and zeroized, via [`secrecy`]) immediately after the
/// two-message exchange completes.
pub struct HandshakeParticipant {
    psk: SecretSlice<u8>,
    keypair: dh::Keypair,
    nonce: [u8; NONCE_LEN],
}

impl HandshakeParticipant {
    /// Generate a fresh DH keypair and nonce from `rng`.
    ///
    /// # Errors
    ///
    /// This never fails in practice; `Result` is kept for uniformity
    /// with the rest of the handshake API (see
    /// [`dh::generate_keypair`]).
    pub fn generate(psk: &[u8], rng: &mut dyn RngCore) -> Result<Self> {
        let keypair = dh::generate_keypair(rng)?;
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);
        Ok(Self {
            psk: SecretSlice::from(psk.to_vec()),
            keypair,
            nonce,
        })
    }

    /// Build a participant from an already-known private exponent and
    /// nonce. Used by the canonical deterministic end-to-end scenario
    /// and by test fixtures; not used by `genkey`/live handshakes.
    #[must_use]
    pub fn from_parts(psk: &[u8], private: [u8; 32], nonce: [u8; NONCE_LEN]) -> Self {
        Self {
            psk: SecretSlice::from(psk.to_vec()),
            keypair: dh::keypair_from_private(private),
            nonce,
        }
    }

    #[must_use]
    pub fn public(&self) -> &[u8; ELEMENT_LEN] {
        &self.keypair.public
    }

    #[must_use]
    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }
}

fn transcript(role: Role, public: &[u8; ELEMENT_LEN], nonce: &[u8; NONCE_LEN]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(role.as_str().len() + ELEMENT_LEN + NONCE_LEN);
    buf.extend_from_slice(role.as_str().as_bytes());
    buf.extend_from_slice(public);
    buf.extend_from_slice(nonce);
    buf
}

fn build_hello(role: Role, participant: &HandshakeParticipant) -> HelloMessage {
    let mac = hmac_sha256(
        participant.psk.expose_secret(),
        &transcript(role, participant.public(), participant.nonce()),
    );
    HelloMessage {
        role,
        public: *participant.public(),
        nonce: *participant.nonce(),
        mac,
    }
}

/// Recompute the transcript MAC for `expected_role` (never the role
/// claimed in `msg` itself — a swapped role field must still fail)
/// and compare in constant time.
fn verify_hello(expected_role: Role, psk: &[u8], msg: &HelloMessage) -> Result<()> {
    let expected_mac = hmac_sha256(psk, &transcript(expected_role, &msg.public, &msg.nonce));
    if expected_mac.ct_eq(&msg.mac).unwrap_u8() == 1 {
        Ok(())
    } else {
        Err(Error::AuthenticationFailed)
    }
}

fn derive_keys(psk: &[u8], shared: &[u8], nonces: &[u8]) -> Result<HandshakeKeys> {
    let prk = hkdf_extract(Some(psk), shared);
    let okm = hkdf_expand(&prk, nonces, OKM_LEN)?;
    let base_nonce: [u8; NONCE_LEN] = sha256(nonces)[..NONCE_LEN]
        .try_into()
        .expect("SHA-256 digest is at least 12 bytes");

    Ok(HandshakeKeys {
        client_enc: okm[0..32].try_into().unwrap(),
        server_enc: okm[32..64].try_into().unwrap(),
        client_mac: okm[64..96].try_into().unwrap(),
        server_mac: okm[96..128].try_into().unwrap(),
        base_nonce,
    })
}

/// Client side of the exchange: send `ClientHello`, receive and
/// verify `ServerHello`, derive [`HandshakeKeys`].
///
/// # Errors
///
/// [`Error::AuthenticationFailed`] if the server's MAC does not
/// match; [`Error::TransportError`] on malformed or oversized
/// messages or transport failure; [`Error::RngFailure`] if the CSPRNG
/// is unavailable.
pub fn run_client(transport: &mut dyn Transport, psk: &[u8], rng: &mut dyn RngCore) -> Result<HandshakeKeys> {
    let participant = HandshakeParticipant::generate(psk, rng)?;
    let hello = build_hello(Role::Client, &participant);
    transport.send_all(&wire::encode(&hello))?;

    let response = transport.recv(MAX_MESSAGE_LEN)?;
    let server_hello = wire::decode(&response)?;
    verify_hello(Role::Server, psk, &server_hello)?;

    let shared = dh::derive_shared(&server_hello.public, &participant.keypair.private)?;
    let mut nonces = Vec::with_capacity(2 * NONCE_LEN);
    nonces.extend_from_slice(participant.nonce());
    nonces.extend_from_slice(&server_hello.nonce);
    derive_keys(psk, &shared, &nonces)
}

/// Server side of the exchange: receive and verify `ClientHello`,
/// send `ServerHello`, derive [`HandshakeKeys`].
///
/// # Errors
///
/// Same error conditions as [`run_client`].
pub fn run_server(transport: &mut dyn Transport, psk: &[u8], rng: &mut dyn RngCore) -> Result<HandshakeKeys> {
    let request = transport.recv(MAX_MESSAGE_LEN)?;
    let client_hello = wire::decode(&request)?;
    verify_hello(Role::Client, psk, &client_hello)?;

    let participant = HandshakeParticipant::generate(psk, rng)?;
    let mut nonces = Vec::with_capacity(2 * NONCE_LEN);
    nonces.extend_from_slice(&client_hello.nonce);
    nonces.extend_from_slice(participant.nonce());
    let shared = dh::derive_shared(&client_hello.public, &participant.keypair.private)?;
    let keys = derive_keys(psk, &shared, &nonces)?;

    let server_hello = build_hello(Role::Server, &participant);
    transport.send_all(&wire::encode(&server_hello))?;
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nonce_of(byte: u8) -> [u8; NONCE_LEN] {
        [byte; NONCE_LEN]
    }

    fn private_of(value: u64) -> [u8; 32] {
        let mut buf = [0u8; 32];
        buf[24..].copy_from_slice(&value.to_be_bytes());
        buf
    }

    /// Canonical end-to-end scenario from §8: fixed PSK, fixed private
    /// exponents and nonces on both sides. Both peers must derive
    /// byte-identical keys.
    #[test]
    fn honest_handshake_derives_identical_keys() {
        let psk = b"unit-test-pre-shared-key";
        let client = HandshakeParticipant::from_parts(psk, private_of(0x1_2345), nonce_of(0x01));
        let server = HandshakeParticipant::from_parts(psk, private_of(0xab_cdef), nonce_of(0x02));

        let client_hello = build_hello(Role::Client, &client);
        verify_hello(Role::Client, psk, &client_hello).unwrap();

        let mut server_nonces = Vec::new();
        server_nonces.extend_from_slice(&client_hello.nonce);
        server_nonces.extend_from_slice(server.nonce());
        let server_shared = dh::derive_shared(&client_hello.public, &server.keypair.private).unwrap();
        let server_keys = derive_keys(psk, &server_shared, &server_nonces).unwrap();

        let server_hello = build_hello(Role::Server, &server);
        verify_hello(Role::Server, psk, &server_hello).unwrap();

        let mut client_nonces = Vec::new();
        client_nonces.extend_from_slice(client.nonce());
        client_nonces.extend_from_slice(&server_hello.nonce);
        let client_shared = dh::derive_shared(&server_hello.public, &client.keypair.private).unwrap();
        let client_keys = derive_keys(psk, &client_shared, &client_nonces).unwrap();

        assert_eq!(client_keys.client_enc, server_keys.client_enc);
        assert_eq!(client_keys.server_enc, server_keys.server_enc);
        assert_eq!(client_keys.client_mac, server_keys.client_mac);
        assert_eq!(client_keys.server_mac, server_keys.server_mac);
        assert_eq!(client_keys.base_nonce, server_keys.base_nonce);
    }

    #[test]
    fn tampered_mac_is_rejected() {
        let psk = b"unit-test-pre-shared-key";
        let client = HandshakeParticipant::from_parts(psk, private_of(0x1_2345), nonce_of(0x01));
        let mut client_hello = build_hello(Role::Client, &client);
        client_hello.mac = [0u8; 32];

        let err = verify_hello(Role::Client, psk, &client_hello).unwrap_err();
        assert_eq!(err, Error::AuthenticationFailed);
    }

    #[test]
    fn tampered_server_mac_is_rejected() {
        let psk = b"unit-test-pre-shared-key";
        let server = HandshakeParticipant::from_parts(psk, private_of(0xab_cdef), nonce_of(0x02));
        let mut server_hello = build_hello(Role::Server, &server);
        server_hello.mac = [0xFFu8; 32];

        let err = verify_hello(Role::Server, psk, &server_hello).unwrap_err();
        assert_eq!(err, Error::AuthenticationFailed);
    }

    #[test]
    fn wrong_psk_is_rejected() {
        let psk = b"unit-test-pre-shared-key";
        let client = HandshakeParticipant::from_parts(psk, private_of(0x1_2345), nonce_of(0x01));
        let client_hello = build_hello(Role::Client, &client);

        let err = verify_hello(Role::Client, b"a different psk", &client_hello).unwrap_err();
        assert_eq!(err, Error::AuthenticationFailed);
    }

    #[test]
    fn role_is_bound_into_the_mac() {
        let psk = b"unit-test-pre-shared-key";
        let client = HandshakeParticipant::from_parts(psk, private_of(0x1_2345), nonce_of(0x01));
        let client_hello = build_hello(Role::Client, &client);

        // A ClientHello replayed as if it were a ServerHello must not
        // verify, even though the bytes are otherwise identical.
        let err = verify_hello(Role::Server, psk, &client_hello).unwrap_err();
        assert_eq!(err, Error::AuthenticationFailed);
    }
}
