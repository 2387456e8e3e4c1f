mod decode;
mod receive;
mod service;
mod simulate;

use std::io::stderr;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use ccsds_mo::receiver::DEFAULT_PORT;
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Receive telemetry packets over UDP.
    ///
    /// Packets are decoded and their measurements, health flags and subsystem are
    /// recorded as parameters. When the duration elapses a snapshot of all parameters
    /// is written to stdout as JSON.
    Receive {
        /// Local address to bind.
        #[arg(short, long, default_value_t = SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))]
        bind: SocketAddr,

        /// Seconds to receive for.
        #[arg(short, long, default_value_t = 60)]
        duration: u64,

        /// Seconds between statistics log messages.
        #[arg(long, default_value_t = 10)]
        stats_interval: u64,

        /// Drop packets that fail checksum or length checks.
        #[arg(long, action)]
        strict: bool,

        /// Start with the sample parameter set.
        #[arg(long, action)]
        seed: bool,
    },
    /// Send simulated telemetry packets over UDP.
    Simulate {
        /// Receiver address.
        #[arg(short, long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)))]
        target: SocketAddr,

        /// Milliseconds between packets.
        #[arg(short, long, default_value_t = 2000)]
        interval: u64,

        /// Number of packets to send. Sends until interrupted if not set.
        #[arg(short, long)]
        count: Option<u64>,
    },
    /// Decode a single space packet and write it as JSON.
    Decode {
        /// Input is hex text rather than binary.
        #[arg(long, action)]
        hex: bool,

        /// Fail on packets with a bad checksum or length field.
        #[arg(long, action)]
        strict: bool,

        /// Packet file.
        input: PathBuf,
    },
    /// Handle an object (JSON) encoded MO request against the sample parameters.
    Request {
        /// Operation name or id, e.g. GetParameterValues or GET_PARAMETER_VALUES.
        #[arg(short, long)]
        operation: String,

        /// JSON request file.
        input: PathBuf,
    },
    /// Handle an XML encoded MO request against the sample parameters.
    Xml {
        /// XML request document.
        input: PathBuf,
    },
    /// Validate an XML MO document.
    Validate {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: service::Format,

        /// XML document.
        input: PathBuf,
    },
    /// Print a sample XML document, or list the known documents.
    Sample {
        /// Root element name, e.g. GetParameterValuesRequest.
        name: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(
            EnvFilter::try_from_env("CCSDS_MO_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    debug!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Receive {
            bind,
            duration,
            stats_interval,
            strict,
            seed,
        } => {
            if stats_interval == 0 {
                bail!("--stats-interval must be greater than 0");
            }
            receive::receive(
                bind,
                Duration::from_secs(duration),
                Duration::from_secs(stats_interval),
                strict,
                seed,
            )
        }
        Commands::Simulate {
            target,
            interval,
            count,
        } => simulate::simulate(target, Duration::from_millis(interval), count),
        Commands::Decode { hex, strict, input } => decode::decode(&input, hex, strict),
        Commands::Request { operation, input } => service::request(&operation, &input),
        Commands::Xml { input } => service::xml(&input),
        Commands::Validate { format, input } => service::validate(&input, &format),
        Commands::Sample { name } => service::sample(name.as_deref()),
    }
}
