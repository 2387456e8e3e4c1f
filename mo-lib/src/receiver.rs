//! UDP telemetry receiver.
//!
//! A [TelemetryReceiver] owns a bound socket and a background thread that decodes each
//! datagram as a space packet, records it in the [TelemetryLog](crate::store::TelemetryLog),
//! and projects its telemetry document into the
//! [ParameterStore](crate::store::ParameterStore).
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossbeam::channel::{bounded, Receiver, Sender, TryRecvError};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, trace, warn};
use typed_builder::TypedBuilder;

use crate::parameter::{units_for, Parameter, ParameterValue};
use crate::spacepacket::Decoder;
use crate::store::{Stores, TelemetryRecord};
use crate::{Error, Result};

pub const DEFAULT_PORT: u16 = 12345;

#[derive(TypedBuilder, Debug, Clone)]
pub struct ReceiverOpts {
    /// Local address to bind.
    #[builder(default = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
    pub bind: SocketAddr,
    /// Socket read timeout. The stop signal is checked once per interval.
    #[builder(default = Duration::from_secs(1))]
    pub poll_interval: Duration,
    /// Largest datagram accepted; longer datagrams are truncated by the socket.
    #[builder(default = 65535)]
    pub buffer_size: usize,
    /// Drop packets that fail checksum or length checks instead of storing them.
    #[builder(default = false)]
    pub strict: bool,
    /// How long [TelemetryReceiver::stop] waits for the thread to exit.
    #[builder(default = Duration::from_secs(2))]
    pub join_timeout: Duration,
}

impl Default for ReceiverOpts {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Default)]
struct Counters {
    datagrams: AtomicU64,
    decoded: AtomicU64,
    failed: AtomicU64,
    suspect: AtomicU64,
    bytes: AtomicU64,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub datagrams: u64,
    pub decoded: u64,
    pub failed: u64,
    /// Decoded packets with a bad checksum or length field.
    pub suspect: u64,
    pub bytes: u64,
}

/// Handle to a running receive loop.
///
/// Dropping the handle without calling [TelemetryReceiver::stop] also ends the loop,
/// within one poll interval, but does not wait for it.
pub struct TelemetryReceiver {
    handle: JoinHandle<()>,
    stop: Sender<()>,
    local_addr: SocketAddr,
    counters: Arc<Counters>,
    join_timeout: Duration,
}

impl TelemetryReceiver {
    /// Bind the socket and start the receive loop.
    ///
    /// # Errors
    /// [Error::Io] if the socket cannot be bound or configured, or the thread cannot be
    /// spawned.
    pub fn spawn(opts: ReceiverOpts, stores: Stores) -> Result<Self> {
        let socket = UdpSocket::bind(opts.bind)?;
        socket.set_read_timeout(Some(opts.poll_interval))?;
        let local_addr = socket.local_addr()?;

        let (stop_tx, stop_rx) = bounded(1);
        let counters = Arc::new(Counters::default());
        let decoder = Decoder::new().with_strict(opts.strict);
        let handle = thread::Builder::new()
            .name("telemetry_receiver".into())
            .spawn({
                let counters = counters.clone();
                let buffer_size = opts.buffer_size;
                move || receive_loop(socket, &stop_rx, &stores, decoder, &counters, buffer_size)
            })?;
        info!(%local_addr, strict = opts.strict, "telemetry receiver started");

        Ok(Self {
            handle,
            stop: stop_tx,
            local_addr,
            counters,
            join_timeout: opts.join_timeout,
        })
    }

    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    #[must_use]
    pub fn stats(&self) -> ReceiverStats {
        ReceiverStats {
            datagrams: self.counters.datagrams.load(Ordering::Relaxed),
            decoded: self.counters.decoded.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            suspect: self.counters.suspect.load(Ordering::Relaxed),
            bytes: self.counters.bytes.load(Ordering::Relaxed),
        }
    }

    /// Signal the loop to stop and wait up to the configured join timeout for it to exit.
    ///
    /// # Errors
    /// [Error::ShutdownTimeout] if the thread is still running after the join timeout,
    /// in which case it is detached, or [Error::ThreadPanicked].
    pub fn stop(self) -> Result<ReceiverStats> {
        // Full or disconnected both mean the loop is already on its way out.
        let _ = self.stop.try_send(());

        let deadline = Instant::now() + self.join_timeout;
        while !self.handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(timeout = ?self.join_timeout, "telemetry receiver did not stop");
                return Err(Error::ShutdownTimeout(self.join_timeout));
            }
            thread::sleep(Duration::from_millis(10));
        }
        let stats = self.stats();
        self.handle.join().map_err(|_| Error::ThreadPanicked)?;
        info!(?stats, "telemetry receiver stopped");
        Ok(stats)
    }
}

fn receive_loop(
    socket: UdpSocket,
    stop: &Receiver<()>,
    stores: &Stores,
    decoder: Decoder,
    counters: &Counters,
    buffer_size: usize,
) {
    let mut buf = vec![0u8; buffer_size];
    loop {
        match stop.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        let (len, source) = match socket.recv_from(&mut buf) {
            Ok(zult) => zult,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                continue
            }
            Err(err) => {
                warn!(%err, "receive failed");
                continue;
            }
        };
        counters.datagrams.fetch_add(1, Ordering::Relaxed);
        counters.bytes.fetch_add(len as u64, Ordering::Relaxed);

        match ingest(stores, &decoder, &buf[..len], Some(source)) {
            Ok(record) => {
                counters.decoded.fetch_add(1, Ordering::Relaxed);
                if record.is_suspect {
                    counters.suspect.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(err) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(%source, len, %err, "dropping undecodable datagram");
            }
        }
    }
    debug!("telemetry receiver loop exit");
}

/// Outcome of ingesting one datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ingested {
    pub sequence_count: u16,
    pub parameters: usize,
    pub is_suspect: bool,
}

/// Decode one datagram and record it.
///
/// The packet is stored in the telemetry log first and its parameters written after,
/// each under its own store lock. A concurrent reader may observe the new packet
/// before the parameters derived from it.
///
/// # Errors
/// [Error::Decode] if `dat` is not a packet `decoder` accepts. Nothing is stored.
pub fn ingest(
    stores: &Stores,
    decoder: &Decoder,
    dat: &[u8],
    source: Option<SocketAddr>,
) -> Result<Ingested> {
    let packet = decoder.decode(dat)?;
    let is_suspect = packet.is_suspect();
    if is_suspect {
        warn!(
            apid = packet.header.apid,
            seq = packet.header.sequence_count,
            integrity = %packet.integrity,
            "suspect packet"
        );
    }

    let record = TelemetryRecord::new(packet, dat.len(), source);
    let sequence_count = record.sequence_count;
    let parameters = record
        .telemetry
        .telemetry()
        .map(|doc| extract_parameters(doc, sequence_count, record.received_at))
        .unwrap_or_default();

    if let Some(previous) = stores.telemetry.insert(record) {
        debug!(
            seq = sequence_count,
            previous = %previous.received_at,
            "sequence count reused; replaced telemetry record"
        );
    }
    let num_params = parameters.len();
    if num_params > 0 {
        stores.parameters.set_many(parameters);
    }
    trace!(seq = sequence_count, num_params, "ingested packet");

    Ok(Ingested {
        sequence_count,
        parameters: num_params,
        is_suspect,
    })
}

/// Parameters carried by a telemetry document.
///
/// Leaves of the `measurements` object become `MEAS_<KEY>` with units derived from the
/// key, leaves of `health` become `HEALTH_<KEY>`, and `subsystem` becomes `SUBSYSTEM`.
/// Null leaves are skipped.
#[must_use]
pub fn extract_parameters(
    telemetry: &Value,
    sequence_count: u16,
    generation_time: DateTime<Utc>,
) -> Vec<(String, Parameter)> {
    let Value::Object(doc) = telemetry else {
        return Vec::new();
    };
    let source = format!("Packet_{sequence_count}");
    let param = |name: String, value: &Value, units: &str| {
        let value = ParameterValue::from_json(value)?;
        let param = Parameter::new(&name, value, generation_time)
            .with_units(units)
            .with_source(&source);
        Some((name, param))
    };

    let mut params = Vec::new();
    if let Some(Value::Object(measurements)) = doc.get("measurements") {
        params.extend(measurements.iter().filter_map(|(key, value)| {
            param(format!("MEAS_{}", key.to_uppercase()), value, units_for(key))
        }));
    }
    if let Some(Value::Object(health)) = doc.get("health") {
        params.extend(health.iter().filter_map(|(key, value)| {
            param(format!("HEALTH_{}", key.to_uppercase()), value, "")
        }));
    }
    if let Some(subsystem) = doc.get("subsystem") {
        params.extend(param("SUBSYSTEM".to_string(), subsystem, ""));
    }
    params
}
