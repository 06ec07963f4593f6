//! The byte-oriented duplex transport the handshake and tunnel are
//! built on. [`Transport`] itself is core; [`UdpTransport`] below and
//! `tests/support::DuplexMemoryTransport` are concrete implementations
//! built on top of it, held to none of the bit-exactness requirements
//! of the primitive/handshake/tunnel layers.

use std::net::UdpSocket;

use crate::error::{Error, Result};

/// A datagram-oriented bidirectional transport.
///
/// Implementations are expected to deliver one "record" per `recv`
/// call; the handshake and tunnel never assume a stream transport
/// that could split or coalesce records (see DESIGN.md).
pub trait Transport {
    /// Write all of `data` to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::TransportError`] if the
    /// underlying connection is broken.
    fn send_all(&mut self, data: &[u8]) -> Result<()>;

    /// Read at most `max` bytes from the peer. An empty return
    /// signals EOF.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::TransportError`] if the
    /// underlying connection is broken.
    fn recv(&mut self, max: usize) -> Result<Vec<u8>>;
}

/// A connected UDP socket as a [`Transport`]. One `recv` returns one
/// datagram, matching the record layer's one-read-one-record
/// assumption for free.
pub struct UdpTransport {
    socket: UdpSocket,
    /// The datagram consumed by `accept` to learn the peer's address,
    /// replayed on the first subsequent `recv` so callers (namely
    /// `handshake::run_server`) can still read it as if it were never
    /// taken off the wire.
    pending: Option<Vec<u8>>,
}

impl UdpTransport {
    /// Bind locally and connect to `peer`, for a client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportError`] if the socket cannot be
    /// created or connected.
    pub fn connect(peer: &str) -> Result<Self> {
        let socket =
            UdpSocket::bind("0.0.0.0:0").map_err(|e| Error::TransportError(e.to_string()))?;
        socket
            .connect(peer)
            .map_err(|e| Error::TransportError(e.to_string()))?;
        Ok(Self {
            socket,
            pending: None,
        })
    }

    /// Bind `listen_addr` and wait for the first datagram, connecting
    /// back to whichever peer sent it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TransportError`] if the socket cannot be bound
    /// or the initial datagram cannot be read.
    pub fn accept(listen_addr: &str, max_message_len: usize) -> Result<Self> {
        let socket =
            UdpSocket::bind(listen_addr).map_err(|e| Error::TransportError(e.to_string()))?;
        let mut buf = vec![0u8; max_message_len];
        let (len, peer) = socket
            .recv_from(&mut buf)
            .map_err(|e| Error::TransportError(e.to_string()))?;
        buf.truncate(len);
        socket
            .connect(peer)
            .map_err(|e| Error::TransportError(e.to_string()))?;
        Ok(Self {
            socket,
            pending: Some(buf),
        })
    }
}

impl Transport for UdpTransport {
    fn send_all(&mut self, data: &[u8]) -> Result<()> {
        self.socket
            .send(data)
            .map_err(|e| Error::TransportError(e.to_string()))?;
        Ok(())
    }

    fn recv(&mut self, max: usize) -> Result<Vec<u8>> {
        if let Some(buf) = self.pending.take() {
            return Ok(buf);
        }
        let mut buf = vec![0u8; max];
        let len = self
            .socket
            .recv(&mut buf)
            .map_err(|e| Error::TransportError(e.to_string()))?;
        buf.truncate(len);
        Ok(buf)
    }
}
