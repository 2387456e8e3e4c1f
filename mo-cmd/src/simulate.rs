use std::net::{SocketAddr, UdpSocket};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use ccsds_mo::spacepacket::{encode, Apid, PrimaryHeader};
use chrono::{SecondsFormat, Utc};
use rand::rngs::ThreadRng;
use rand::Rng;
use serde_json::{json, Value};
use tracing::{debug, info};

pub const APID: Apid = 100;
const SPACECRAFT_ID: &str = "CCSDS-SAT-01";
const SUBSYSTEMS: [&str; 4] = ["POWER", "THERMAL", "ATTITUDE", "COMMUNICATION"];

fn round(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Generates plausible spacecraft telemetry documents.
pub struct Simulator {
    counter: u32,
    rng: ThreadRng,
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            counter: 0,
            rng: rand::thread_rng(),
        }
    }

    fn health(&mut self) -> &'static str {
        if self.rng.gen_bool(0.95) {
            "NOMINAL"
        } else {
            "DEGRADED"
        }
    }

    pub fn document(&mut self) -> Value {
        let rng = &mut self.rng;
        let measurements = json!({
            "temperature": round(25.0 + rng.gen_range(-5.0..10.0), 2),
            "voltage": round(12.0 + rng.gen_range(-1.5..1.5), 3),
            "current": round(2.5 + rng.gen_range(-0.5..0.5), 2),
            "gyro_x": round(rng.gen_range(-0.1..0.1), 4),
            "gyro_y": round(rng.gen_range(-0.1..0.1), 4),
            "gyro_z": round(rng.gen_range(-0.1..0.1), 4),
            "battery_charge": rng.gen_range(20..=100),
        });
        let subsystem = SUBSYSTEMS[self.counter as usize % SUBSYSTEMS.len()];
        let health = json!({
            "power_system": self.health(),
            "thermal_system": self.health(),
            "attitude_control": self.health(),
            "communication": self.health(),
        });
        json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "spacecraft_id": SPACECRAFT_ID,
            "packet_counter": self.counter % (u32::from(PrimaryHeader::SEQ_MAX) + 1),
            "measurements": measurements,
            "health": health,
            "subsystem": subsystem,
        })
    }

    /// The next telemetry document encoded as a space packet.
    pub fn next_packet(&mut self) -> Result<Vec<u8>> {
        let doc = self.document();
        let payload = serde_json::to_vec(&doc)?;
        let packet = encode(APID, self.counter, &payload).context("encoding telemetry packet")?;
        self.counter = self.counter.wrapping_add(1);
        Ok(packet)
    }
}

/// Send simulated telemetry to `target`, `count` packets or forever.
pub fn simulate(target: SocketAddr, interval: Duration, count: Option<u64>) -> Result<()> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).context("binding sender socket")?;
    let mut sim = Simulator::new();
    info!(%target, ?interval, ?count, "sending simulated telemetry");

    let mut sent = 0u64;
    while count.map_or(true, |c| sent < c) {
        if sent > 0 {
            sleep(interval);
        }
        let packet = sim.next_packet()?;
        socket
            .send_to(&packet, target)
            .with_context(|| format!("sending to {target}"))?;
        sent += 1;
        debug!(sent, len = packet.len(), "sent packet");
        if sent % 10 == 0 {
            info!(sent, "progress");
        }
    }
    info!(sent, "done");
    Ok(())
}
