#![allow(dead_code)]

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::mpsc::{self, Receiver, Sender};

use sealtun::error::{Error, Result};
use sealtun::transport::Transport;

const SEALTUN: &str = env!("CARGO_BIN_EXE_sealtun");
const TMP_DIR: &str = env!("CARGO_TARGET_TMPDIR");

#[derive(Debug)]
pub struct Output {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

pub fn run(args: &[&str]) -> Output {
    let mut command = Command::new(SEALTUN);
    command.env("NO_COLOR", "1");
    command.env_remove("PAGER");

    for arg in args {
        command.arg(arg);
    }

    let output = command.output().unwrap();

    Output {
        exit_code: output.status.code().unwrap(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}

pub fn tmp_path(file_name: &str) -> PathBuf {
    Path::new(TMP_DIR).join(file_name)
}

pub fn checksum(path: &Path) -> String {
    let payload = std::fs::read(path).unwrap();
    let hash = blake3::hash(&payload);
    hash.to_hex().to_string()
}

/// An in-memory duplex pair implementing [`Transport`], the direct
/// analogue of the original implementation's `memory_transport.py`:
/// one endpoint's sends are the other's receives, one whole `Vec<u8>`
/// datagram per channel message.
pub struct DuplexMemoryTransport {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl DuplexMemoryTransport {
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_b) = mpsc::channel();
        let (tx_b, rx_a) = mpsc::channel();
        (
            Self { tx: tx_a, rx: rx_a },
            Self { tx: tx_b, rx: rx_b },
        )
    }
}

impl Transport for DuplexMemoryTransport {
    fn send_all(&mut self, data: &[u8]) -> Result<()> {
        self.tx
            .send(data.to_vec())
            .map_err(|e| Error::TransportError(e.to_string()))
    }

    fn recv(&mut self, _max: usize) -> Result<Vec<u8>> {
        self.rx
            .recv()
            .map_err(|e| Error::TransportError(e.to_string()))
    }
}
