//! The record protocol: per-direction sequence numbers, nonce
//! derivation, replay rejection, on-wire framing.
//!
//! Wire format per record: `seq (8 bytes BE) ‖ ciphertext ‖ tag (16
//! bytes)`. No sliding receive window — `recv_seq` always advances to
//! `seq + 1` on acceptance, so gaps from lost records are tolerated
//! but anything behind the high-water mark is a replay.

use crate::error::{Error, Result};
use crate::handshake::HandshakeKeys;
use crate::primitives::aead;
use crate::transport::Transport;

const SEQ_LEN: usize = 8;
const TAG_LEN: usize = 16;
const MIN_FRAME_LEN: usize = SEQ_LEN + TAG_LEN;
/// One read is assumed to carry one whole record (datagram
/// semantics); this is comfortably above the CLI's 2048-byte file
/// chunks plus framing overhead.
const RECV_BUF_LEN: usize = 4096;

/// The single direction's encryption key and nonce prefix fed to a
/// [`TunnelState`]. Client-side senders use `client_enc`; server-side
/// senders use `server_enc`; receivers use the peer's corresponding
/// key.
#[derive(Clone)]
pub struct SessionKeys {
    pub enc_key: [u8; 32],
    pub base_nonce: [u8; 12],
}

impl SessionKeys {
    /// Keys this endpoint uses to *send*, given which side of the
    /// handshake it played.
    #[must_use]
    pub fn for_sender(keys: &HandshakeKeys, is_client: bool) -> Self {
        let enc_key = if is_client {
            keys.client_enc
        } else {
            keys.server_enc
        };
        Self {
            enc_key,
            base_nonce: keys.base_nonce,
        }
    }

    /// Keys this endpoint uses to *receive*: the other side's sender
    /// key, since client_enc/server_enc name directions, not peers.
    #[must_use]
    pub fn for_receiver(keys: &HandshakeKeys, is_client: bool) -> Self {
        Self::for_sender(keys, !is_client)
    }
}

fn derive_nonce(base_nonce: &[u8; 12], seq: u64) -> [u8; 12] {
    let mut seq_field = [0u8; 12];
    seq_field[4..].copy_from_slice(&seq.to_be_bytes());
    let mut nonce = [0u8; 12];
    for i in 0..12 {
        nonce[i] = base_nonce[i] ^ seq_field[i];
    }
    nonce
}

/// Per-endpoint mutable tunnel state: keys plus independent send/recv
/// sequence counters.
pub struct TunnelState {
    send_keys: SessionKeys,
    recv_keys: SessionKeys,
    send_seq: u64,
    recv_seq: u64,
}

impl TunnelState {
    #[must_use]
    pub fn new(send_keys: SessionKeys, recv_keys: SessionKeys) -> Self {
        Self {
            send_keys,
            recv_keys,
            send_seq: 0,
            recv_seq: 0,
        }
    }

    /// Build tunnel state directly from the handshake's
    /// [`HandshakeKeys`], given which side of the handshake this
    /// endpoint played.
    #[must_use]
    pub fn from_handshake_keys(keys: &HandshakeKeys, is_client: bool) -> Self {
        Self::new(
            SessionKeys::for_sender(keys, is_client),
            SessionKeys::for_receiver(keys, is_client),
        )
    }

    #[must_use]
    pub fn send_seq(&self) -> u64 {
        self.send_seq
    }

    #[must_use]
    pub fn recv_seq(&self) -> u64 {
        self.recv_seq
    }

    /// Encrypt `payload`, frame it, and push it through `transport`
    /// in a single `send_all` call.
    ///
    /// # Errors
    ///
    /// [`Error::SequenceExhausted`] if `send_seq` would overflow
    /// `u64`; [`Error::TransportError`] if the transport write fails.
    pub fn send_packet(&mut self, transport: &mut dyn Transport, payload: &[u8]) -> Result<()> {
        self.send_packet_with_aad(transport, payload, b"")
    }

    /// As [`Self::send_packet`], with explicit associated data (never
    /// transmitted; the receiver must reproduce it independently).
    pub fn send_packet_with_aad(
        &mut self,
        transport: &mut dyn Transport,
        payload: &[u8],
        aad: &[u8],
    ) -> Result<()> {
        let nonce = derive_nonce(&self.send_keys.base_nonce, self.send_seq);
        let (ciphertext, tag) = aead::seal(&self.send_keys.enc_key, &nonce, payload, aad)?;

        let mut frame = Vec::with_capacity(SEQ_LEN + ciphertext.len() + TAG_LEN);
        frame.extend_from_slice(&self.send_seq.to_be_bytes());
        frame.extend_from_slice(&ciphertext);
        frame.extend_from_slice(&tag);

        transport.send_all(&frame)?;

        self.send_seq = self
            .send_seq
            .checked_add(1)
            .ok_or(Error::SequenceExhausted)?;
        Ok(())
    }

    /// Read, authenticate, and decrypt one record.
    ///
    /// # Errors
    ///
    /// [`Error::ShortRead`] if the datagram is smaller than a minimal
    /// frame; [`Error::Replay`] if `seq < recv_seq`;
    /// [`Error::AuthenticationFailed`] on tag mismatch (no plaintext
    /// is returned, and `recv_seq` is left unchanged);
    /// [`Error::TransportError`] if the transport read fails.
    pub fn receive_packet(&mut self, transport: &mut dyn Transport) -> Result<Vec<u8>> {
        self.receive_packet_with_aad(transport, b"")
    }

    /// As [`Self::receive_packet`], verifying against explicit
    /// associated data.
    pub fn receive_packet_with_aad(
        &mut self,
        transport: &mut dyn Transport,
        expected_aad: &[u8],
    ) -> Result<Vec<u8>> {
        let buf = transport.recv(RECV_BUF_LEN)?;
        if buf.len() < MIN_FRAME_LEN {
            return Err(Error::ShortRead);
        }

        let seq = u64::from_be_bytes(buf[..SEQ_LEN].try_into().unwrap());
        let tag = &buf[buf.len() - TAG_LEN..];
        let ciphertext = &buf[SEQ_LEN..buf.len() - TAG_LEN];

        if seq < self.recv_seq {
            return Err(Error::Replay);
        }

        let nonce = derive_nonce(&self.recv_keys.base_nonce, seq);
        let plaintext = aead::open(&self.recv_keys.enc_key, &nonce, ciphertext, expected_aad, tag)?;

        self.recv_seq = seq + 1;
        Ok(plaintext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LoopbackTransport {
        inbox: std::collections::VecDeque<Vec<u8>>,
    }

    impl LoopbackTransport {
        fn new() -> Self {
            Self {
                inbox: std::collections::VecDeque::new(),
            }
        }
    }

    impl Transport for LoopbackTransport {
        fn send_all(&mut self, data: &[u8]) -> Result<()> {
            self.inbox.push_back(data.to_vec());
            Ok(())
        }

        fn recv(&mut self, _max: usize) -> Result<Vec<u8>> {
            Ok(self.inbox.pop_front().unwrap_or_default())
        }
    }

    fn test_keys() -> (SessionKeys, SessionKeys) {
        (
            SessionKeys {
                enc_key: [0x11u8; 32],
                base_nonce: [0x22u8; 12],
            },
            SessionKeys {
                enc_key: [0x33u8; 32],
                base_nonce: [0x44u8; 12],
            },
        )
    }

    #[test]
    fn record_roundtrip_in_order() {
        let (a, b) = test_keys();
        let mut sender = TunnelState::new(a.clone(), b.clone());
        let mut receiver = TunnelState::new(b, a);
        let mut transport = LoopbackTransport::new();

        for chunk in [
            b"hello".to_vec(),
            b"world".to_vec(),
            vec![0x5au8; 1024],
            b"END".to_vec(),
        ] {
            sender.send_packet(&mut transport, &chunk).unwrap();
            let received = receiver.receive_packet(&mut transport).unwrap();
            assert_eq!(received, chunk);
        }
        assert_eq!(sender.send_seq(), 4);
        assert_eq!(receiver.recv_seq(), 4);
    }

    #[test]
    fn replaying_an_accepted_sequence_is_rejected() {
        let (a, b) = test_keys();
        let mut sender = TunnelState::new(a.clone(), b.clone());
        let mut receiver = TunnelState::new(b, a);
        let mut transport = LoopbackTransport::new();

        for _ in 0..6 {
            sender.send_packet(&mut transport, b"chunk").unwrap();
        }
        let frames: Vec<Vec<u8>> = transport.inbox.drain(..).collect();

        for frame in &frames[..6] {
            transport.inbox.push_back(frame.clone());
            receiver.receive_packet(&mut transport).unwrap();
        }
        assert_eq!(receiver.recv_seq(), 6);

        // Replay seq=5 (already accepted).
        transport.inbox.push_back(frames[5].clone());
        let err = receiver.receive_packet(&mut transport).unwrap_err();
        assert_eq!(err, Error::Replay);
        assert_eq!(receiver.recv_seq(), 6);
    }

    #[test]
    fn out_of_order_below_high_water_mark_is_dropped() {
        let (a, b) = test_keys();
        let mut sender = TunnelState::new(a.clone(), b.clone());
        let mut receiver = TunnelState::new(b, a);
        let mut transport = LoopbackTransport::new();

        for _ in 0..8 {
            sender.send_packet(&mut transport, b"chunk").unwrap();
        }
        let frames: Vec<Vec<u8>> = transport.inbox.drain(..).collect();

        // Accept seq=5 directly (skip 0..4, simulating loss).
        transport.inbox.push_back(frames[5].clone());
        receiver.receive_packet(&mut transport).unwrap();
        assert_eq!(receiver.recv_seq(), 6);

        // seq=3 is now behind the high-water mark.
        transport.inbox.push_back(frames[3].clone());
        let err = receiver.receive_packet(&mut transport).unwrap_err();
        assert_eq!(err, Error::Replay);

        // seq=7 is still ahead and succeeds.
        transport.inbox.push_back(frames[7].clone());
        receiver.receive_packet(&mut transport).unwrap();
        assert_eq!(receiver.recv_seq(), 8);
    }

    #[test]
    fn short_read_is_rejected() {
        let (a, b) = test_keys();
        let mut receiver = TunnelState::new(b, a);
        let mut transport = LoopbackTransport::new();
        transport.inbox.push_back(vec![0u8; 23]);

        let err = receiver.receive_packet(&mut transport).unwrap_err();
        assert_eq!(err, Error::ShortRead);
    }

    #[test]
    fn tampered_ciphertext_fails_authentication_without_advancing_recv_seq() {
        let (a, b) = test_keys();
        let mut sender = TunnelState::new(a.clone(), b.clone());
        let mut receiver = TunnelState::new(b, a);
        let mut transport = LoopbackTransport::new();

        sender.send_packet(&mut transport, b"chunk").unwrap();
        let mut frame = transport.inbox.pop_front().unwrap();
        let last = frame.len() - 1;
        frame[last] ^= 0x01;
        transport.inbox.push_back(frame);

        let err = receiver.receive_packet(&mut transport).unwrap_err();
        assert_eq!(err, Error::AuthenticationFailed);
        assert_eq!(receiver.recv_seq(), 0);
    }

    #[test]
    fn send_seq_is_strictly_increasing() {
        let (a, b) = test_keys();
        let mut sender = TunnelState::new(a, b);
        let mut transport = LoopbackTransport::new();

        for i in 0..5 {
            assert_eq!(sender.send_seq(), i);
            sender.send_packet(&mut transport, b"x").unwrap();
        }
        assert_eq!(sender.send_seq(), 5);
    }

    #[test]
    fn send_seq_exhaustion_is_reported() {
        let (a, b) = test_keys();
        let mut sender = TunnelState::new(a, b);
        sender.send_seq = u64::MAX;
        let mut transport = LoopbackTransport::new();

        let err = sender.send_packet(&mut transport, b"x").unwrap_err();
        assert_eq!(err, Error::SequenceExhausted);
    }
}
