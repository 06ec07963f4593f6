pub mod cli;

use std::fs;
use std::io::Read as _;

use rand::rngs::OsRng;

use crate::error::Error;
use crate::handshake::{run_client, run_server};
use crate::transport::{Transport, UdpTransport};
use crate::tunnel::TunnelState;

/// Handshake messages are tiny JSON; 4096 bytes is generous headroom.
const MAX_HANDSHAKE_MESSAGE_LEN: usize = 4096;
/// Application-level chunk size used when streaming a file through the
/// tunnel; unrelated to the record protocol's own on-wire framing.
const CHUNK_SIZE: usize = 2048;
const END_MARKER: &[u8] = b"END";

fn load_psk(path: &str) -> Result<Vec<u8>, i32> {
    fs::read(path).map_err(|e| {
        eprintln!("fatal: could not read PSK file '{path}': {e}.");
        1
    })
}

fn report(err: &Error) -> i32 {
    eprintln!("fatal: {err}");
    1
}

pub fn genkey(output: Option<&str>) -> Result<(), i32> {
    let mut psk = [0u8; 32];
    rand::RngCore::fill_bytes(&mut OsRng, &mut psk);
    let encoded = hex::encode(psk);

    match output {
        Some(path) => fs::write(path, &encoded).map_err(|e| {
            eprintln!("fatal: could not write key to '{path}': {e}.");
            1
        })?,
        None => println!("{encoded}"),
    }
    Ok(())
}

pub fn server(listen: &str, psk_file: &str, output: &str) -> Result<(), i32> {
    let psk = load_psk(psk_file)?;

    let mut transport =
        UdpTransport::accept(listen, MAX_HANDSHAKE_MESSAGE_LEN).map_err(|e| report(&e))?;
    let keys = run_server(&mut transport, &psk, &mut OsRng).map_err(|e| report(&e))?;
    let mut tunnel = TunnelState::from_handshake_keys(&keys, false);

    receive_file(&mut tunnel, &mut transport, output).map_err(|e| report(&e))?;
    Ok(())
}

pub fn client(connect: &str, psk_file: &str, input: &str) -> Result<(), i32> {
    let psk = load_psk(psk_file)?;

    let mut transport = UdpTransport::connect(connect).map_err(|e| report(&e))?;
    let keys = run_client(&mut transport, &psk, &mut OsRng).map_err(|e| report(&e))?;
    let mut tunnel = TunnelState::from_handshake_keys(&keys, true);

    send_file(&mut tunnel, &mut transport, input).map_err(|e| report(&e))?;
    Ok(())
}

fn send_file(
    tunnel: &mut TunnelState,
    transport: &mut dyn Transport,
    path: &str,
) -> Result<(), Error> {
    let mut file = fs::File::open(path).map_err(|e| Error::TransportError(e.to_string()))?;
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| Error::TransportError(e.to_string()))?;
        if n == 0 {
            break;
        }
        tunnel.send_packet(transport, &buf[..n])?;
    }
    tunnel.send_packet(transport, END_MARKER)
}

fn receive_file(
    tunnel: &mut TunnelState,
    transport: &mut dyn Transport,
    path: &str,
) -> Result<(), Error> {
    let mut file = fs::File::create(path).map_err(|e| Error::TransportError(e.to_string()))?;
    loop {
        let chunk = tunnel.receive_packet(transport)?;
        if chunk == END_MARKER {
            break;
        }
        std::io::Write::write_all(&mut file, &chunk)
            .map_err(|e| Error::TransportError(e.to_string()))?;
    }
    Ok(())
}
