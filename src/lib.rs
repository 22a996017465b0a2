//! ICMP echo based path diagnostics: ping and traceroute over a raw IPv4 socket.

pub mod config;
pub mod error;
mod exchange;
pub mod packet;
pub mod pinger;
pub mod probe;
pub mod report;
pub mod tracer;
pub mod transport;

pub use config::{PingConfig, TraceConfig};
pub use error::{FailureReason, ProbeError, ProbeResult};
pub use pinger::Pinger;
pub use probe::{Identifier, OutcomeKind, ProbeOutcome};
pub use tracer::Tracer;
pub use transport::{IcmpChannel, Transport, resolve};
