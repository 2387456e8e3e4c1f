use std::io::stdout;
use std::net::SocketAddr;
use std::thread::sleep;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ccsds_mo::receiver::{ReceiverOpts, TelemetryReceiver};
use ccsds_mo::store::Stores;
use tracing::info;

pub fn receive(
    bind: SocketAddr,
    duration: Duration,
    stats_interval: Duration,
    strict: bool,
    seed: bool,
) -> Result<()> {
    let stores = Stores::new();
    if seed {
        stores.parameters.seed_samples();
    }
    let opts = ReceiverOpts::builder().bind(bind).strict(strict).build();
    let receiver = TelemetryReceiver::spawn(opts, stores.clone())
        .with_context(|| format!("starting receiver on {bind}"))?;

    let deadline = Instant::now() + duration;
    loop {
        let now = Instant::now();
        if now >= deadline {
            break;
        }
        sleep(stats_interval.min(deadline - now));
        let stats = receiver.stats();
        let store = stores.statistics();
        info!(
            datagrams = stats.datagrams,
            decoded = stats.decoded,
            failed = stats.failed,
            suspect = stats.suspect,
            packets = store.total_packets,
            parameters = store.total_parameters,
            "receiving"
        );
    }

    let stats = receiver.stop().context("stopping receiver")?;
    info!(?stats, statistics = ?stores.statistics(), "receiver finished");
    serde_json::to_writer_pretty(stdout(), &stores.parameters.get_all())?;
    println!();
    Ok(())
}
