use clap::{Parser, Subcommand};
use icmprobe::config::{
    DEFAULT_MAX_HOPS, DEFAULT_PING_COUNT, DEFAULT_PING_INTERVAL_MS, DEFAULT_PING_SIZE, DEFAULT_PING_TIMEOUT_MS,
    DEFAULT_TRACE_TARGET, DEFAULT_TRACE_TIMEOUT_MS,
};
use icmprobe::{IcmpChannel, Identifier, PingConfig, Pinger, TraceConfig, Tracer, report, resolve};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send ICMP echo requests and report the round trip time of each
    Ping {
        /// Hostname or IPv4 address to ping
        destination: String,

        /// Number of echo requests to send
        #[arg(short, long, default_value_t = DEFAULT_PING_COUNT)]
        count: u16,

        /// Size of the echo request payload in bytes
        #[arg(short, long, default_value_t = DEFAULT_PING_SIZE)]
        size: usize,

        /// Interval between echo requests in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_PING_INTERVAL_MS)]
        interval: u64,

        /// Timeout for each echo reply in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_PING_TIMEOUT_MS)]
        timeout: u64,

        /// Echo identifier to use instead of a random one
        #[arg(long)]
        identifier: Option<u16>,
    },
    /// Discover the hops on the path to a host
    Traceroute {
        /// Hostname or IPv4 address to trace
        #[arg(default_value = DEFAULT_TRACE_TARGET)]
        destination: String,

        /// Maximum number of hops to probe
        #[arg(short, long, default_value_t = DEFAULT_MAX_HOPS)]
        max_hops: u8,

        /// Timeout for each hop in milliseconds
        #[arg(short, long, default_value_t = DEFAULT_TRACE_TIMEOUT_MS)]
        timeout: u64,

        /// Ignore replies carrying another session's echo identifier
        #[arg(long)]
        verify_identifier: bool,

        /// Echo identifier to use instead of a random one
        #[arg(long)]
        identifier: Option<u16>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Ping { destination, count, size, interval, timeout, identifier } => {
            let address = resolve(&destination)?;
            let channel = IcmpChannel::open()?;
            let identifier = identifier.map_or_else(Identifier::random, Identifier::from);
            let config = PingConfig {
                count,
                payload_size: size,
                interval: Duration::from_millis(interval),
                timeout: Duration::from_millis(timeout),
                ..PingConfig::new(address, identifier)
            };

            println!("{}", report::ping_banner(&destination, address, size));
            Pinger::new(channel, config).run(|outcome| println!("{}", report::ping_line(outcome)));
        }
        Command::Traceroute { destination, max_hops, timeout, verify_identifier, identifier } => {
            let address = resolve(&destination)?;
            let channel = IcmpChannel::open()?;
            let identifier = identifier.map_or_else(Identifier::random, Identifier::from);
            let config = TraceConfig {
                max_hops,
                timeout: Duration::from_millis(timeout),
                verify_identifier,
                ..TraceConfig::new(address, identifier)
            };

            println!("{}", report::trace_banner(&destination, address, max_hops));
            Tracer::new(channel, config).run(|outcome| println!("{}", report::hop_line(outcome)));
        }
    }
    Ok(())
}
