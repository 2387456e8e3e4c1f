#![allow(dead_code)]
use std::net::{SocketAddr, UdpSocket};
use std::thread::sleep;
use std::time::{Duration, Instant};

use ccsds_mo::receiver::{ReceiverOpts, TelemetryReceiver};
use ccsds_mo::store::Stores;

/// Start a receiver on an ephemeral loopback port.
pub fn loopback_receiver(stores: &Stores) -> TelemetryReceiver {
    let opts = ReceiverOpts::builder()
        .bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .poll_interval(Duration::from_millis(50))
        .build();
    TelemetryReceiver::spawn(opts, stores.clone()).expect("failed to start receiver")
}

pub fn send(to: SocketAddr, dat: &[u8]) {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("failed to bind sender");
    socket.send_to(dat, to).expect("failed to send datagram");
}

/// Poll `check` until it holds or 5 seconds pass.
pub fn wait_for<F: FnMut() -> bool>(mut check: F) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        sleep(Duration::from_millis(10));
    }
    check()
}
