use std::fmt;

/// Outcomes the core can yield. Not every variant is a "failure" in the
/// exception sense — `Replay` and `ShortRead` are routine drops that let
/// the session continue; `SequenceExhausted` and `TransportError`
/// terminate it; `RngFailure` aborts a handshake in progress.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// Wrong key/nonce length handed to a primitive. A programming
    /// error, not a runtime condition — fail loudly.
    InvalidArgument(String),
    /// Tag or MAC mismatch. The core never returns plaintext alongside
    /// this variant.
    AuthenticationFailed,
    /// `seq < recv_seq`. Drop the record; the session continues.
    Replay,
    /// Datagram shorter than `8 + 16` bytes. Drop the record; the
    /// session continues.
    ShortRead,
    /// `send_seq` would overflow `u64`. The session must end.
    SequenceExhausted,
    /// The underlying transport's `send_all`/`recv` failed.
    TransportError(String),
    /// The CSPRNG was unavailable during handshake setup.
    RngFailure(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(reason) => write!(f, "Invalid argument: {reason}"),
            Self::AuthenticationFailed => write!(
                f,
                "Authentication failed. The tag or MAC did not match; the \
                 data is corrupted, tampered with, or encrypted under a \
                 different key."
            ),
            Self::Replay => write!(f, "Record rejected: sequence number already seen."),
            Self::ShortRead => write!(f, "Record rejected: datagram shorter than a minimal frame."),
            Self::SequenceExhausted => {
                write!(f, "Send sequence number exhausted; session must end.")
            }
            Self::TransportError(reason) => write!(f, "Transport error: {reason}"),
            Self::RngFailure(reason) => write!(f, "Random number generator unavailable: {reason}"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;
