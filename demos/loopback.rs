//! Runs a full handshake + a handful of records over an in-process
//! duplex transport, printing what each side derives and exchanges.
//!
//! `cargo run --example loopback`

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rand::rngs::OsRng;
use sealtun::error::Result;
use sealtun::handshake::{run_client, run_server};
use sealtun::transport::Transport;
use sealtun::tunnel::TunnelState;

/// A single-process duplex pair: each side's `send_all` pushes onto
/// the other's queue. Only fit for this demo and for exercising the
/// public API without a real socket.
struct Loopback {
    outgoing: Arc<Mutex<VecDeque<Vec<u8>>>>,
    incoming: Arc<Mutex<VecDeque<Vec<u8>>>>,
}

impl Loopback {
    fn pair() -> (Self, Self) {
        let a_to_b = Arc::new(Mutex::new(VecDeque::new()));
        let b_to_a = Arc::new(Mutex::new(VecDeque::new()));
        (
            Self {
                outgoing: Arc::clone(&a_to_b),
                incoming: Arc::clone(&b_to_a),
            },
            Self {
                outgoing: b_to_a,
                incoming: a_to_b,
            },
        )
    }
}

impl Transport for Loopback {
    fn send_all(&mut self, data: &[u8]) -> Result<()> {
        self.outgoing.lock().unwrap().push_back(data.to_vec());
        Ok(())
    }

    fn recv(&mut self, _max: usize) -> Result<Vec<u8>> {
        loop {
            if let Some(frame) = self.incoming.lock().unwrap().pop_front() {
                return Ok(frame);
            }
            std::thread::yield_now();
        }
    }
}

fn main() {
    let psk = b"loopback-demo-pre-shared-key";
    let (mut client_transport, mut server_transport) = Loopback::pair();

    let server = std::thread::spawn(move || {
        let keys = run_server(&mut server_transport, psk, &mut OsRng).expect("server handshake");
        let mut tunnel = TunnelState::from_handshake_keys(&keys, false);
        for _ in 0..3 {
            let record = tunnel.receive_packet(&mut server_transport).expect("receive");
            println!("server received: {}", String::from_utf8_lossy(&record));
        }
    });

    let keys = run_client(&mut client_transport, psk, &mut OsRng).expect("client handshake");
    println!("client derived base_nonce: {}", hex::encode(keys.base_nonce));

    let mut tunnel = TunnelState::from_handshake_keys(&keys, true);
    for message in [b"hello".as_slice(), b"from".as_slice(), b"sealtun".as_slice()] {
        tunnel
            .send_packet(&mut client_transport, message)
            .expect("send");
    }

    server.join().expect("server thread");
}
