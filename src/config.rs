use crate::probe::Identifier;
use std::net::Ipv4Addr;
use std::time::Duration;

pub const DEFAULT_PING_COUNT: u16 = 4;
pub const DEFAULT_PING_SIZE: usize = 56;
pub const DEFAULT_PING_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 1000;

pub const DEFAULT_TRACE_TARGET: &str = "google.com";
pub const DEFAULT_MAX_HOPS: u8 = 20;
pub const DEFAULT_TRACE_TIMEOUT_MS: u64 = 2000;

/// Payload carried by every traceroute probe.
pub const TRACE_PAYLOAD: &[u8] = b"PING";

/// Parameters of one ping run.
#[derive(Debug, Clone, Copy)]
pub struct PingConfig {
    pub destination: Ipv4Addr,
    pub identifier: Identifier,
    pub count: u16,
    pub payload_size: usize,
    pub interval: Duration,
    pub timeout: Duration,
}

impl PingConfig {
    /// A config with the default count, size, interval and timeout.
    pub fn new(destination: Ipv4Addr, identifier: Identifier) -> Self {
        Self {
            destination,
            identifier,
            count: DEFAULT_PING_COUNT,
            payload_size: DEFAULT_PING_SIZE,
            interval: Duration::from_millis(DEFAULT_PING_INTERVAL_MS),
            timeout: Duration::from_millis(DEFAULT_PING_TIMEOUT_MS),
        }
    }
}

/// Parameters of one traceroute run.
#[derive(Debug, Clone, Copy)]
pub struct TraceConfig {
    pub destination: Ipv4Addr,
    pub identifier: Identifier,
    pub max_hops: u8,
    pub timeout: Duration,
    /// Reject replies whose echo identifier belongs to another session.
    pub verify_identifier: bool,
}

impl TraceConfig {
    pub fn new(destination: Ipv4Addr, identifier: Identifier) -> Self {
        Self {
            destination,
            identifier,
            max_hops: DEFAULT_MAX_HOPS,
            timeout: Duration::from_millis(DEFAULT_TRACE_TIMEOUT_MS),
            verify_identifier: false,
        }
    }
}
