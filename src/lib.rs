pub mod error;
pub mod handshake;
pub mod primitives;
pub mod transport;
pub mod tunnel;
pub mod wire;

pub use error::{Error, Result};
