use crate::error::FailureReason;
use crate::probe::{OutcomeKind, ProbeOutcome};
use std::net::Ipv4Addr;
use std::time::Duration;

pub fn ping_banner(host: &str, address: Ipv4Addr, payload_size: usize) -> String {
    format!("PING {} ({}): {} data bytes", host, address, payload_size)
}

pub fn trace_banner(host: &str, address: Ipv4Addr, max_hops: u8) -> String {
    format!("Traceroute to {} ({}), {} hops max", host, address, max_hops)
}

/// One line of ping output.
pub fn ping_line(outcome: &ProbeOutcome) -> String {
    let peer = peer_or_unknown(outcome.peer);
    match &outcome.kind {
        OutcomeKind::EchoReply { sequence } => format!(
            "{} bytes from {}: icmp_seq={} time={:.3} ms",
            outcome.bytes,
            peer,
            sequence,
            millis(outcome.rtt.unwrap_or_default())
        ),
        OutcomeKind::TimeExceeded | OutcomeKind::Unclassified { .. } => {
            format!("Received unclassified reply from {} for icmp_seq {}", peer, outcome.slot)
        }
        OutcomeKind::Failed(reason) => match reason {
            FailureReason::Timeout => format!("Request timeout for icmp_seq {}", outcome.slot),
            FailureReason::IdentifierMismatch { received } => {
                format!("Received ICMP echo reply with mismatched ID {} from {}", received, peer)
            }
            FailureReason::UnexpectedType { icmp_type, code } => format!(
                "Received unexpected ICMP message type {} code {} from {}",
                icmp_type, code, peer
            ),
            FailureReason::WriteError(err) => format!("Failed to send ICMP message: {}", err),
            FailureReason::ReadError(err) => format!("Failed to read ICMP reply: {}", err),
            FailureReason::ParseError(err) => format!("Failed to parse ICMP message: {}", err),
            FailureReason::EncodeError(err) => format!("Failed to marshal ICMP message: {}", err),
        },
    }
}

/// One line of traceroute output.
pub fn hop_line(outcome: &ProbeOutcome) -> String {
    let ttl = outcome.slot;
    let peer = peer_or_unknown(outcome.peer);
    let rtt = millis(outcome.rtt.unwrap_or_default());
    match &outcome.kind {
        OutcomeKind::TimeExceeded => format!("{:2}  {}  {:.2}ms", ttl, peer, rtt),
        OutcomeKind::EchoReply { .. } => format!("{:2}  {}  {:.2}ms (destination)", ttl, peer, rtt),
        OutcomeKind::Unclassified { .. } => format!("{:2}  {}  ?", ttl, peer),
        OutcomeKind::Failed(reason) => {
            let marker = match reason {
                FailureReason::Timeout => "timeout",
                FailureReason::WriteError(_) => "write error",
                FailureReason::ReadError(_) => "read error",
                FailureReason::ParseError(_) => "parse error",
                FailureReason::IdentifierMismatch { .. } => "identifier mismatch",
                FailureReason::UnexpectedType { .. } => "unexpected reply",
                FailureReason::EncodeError(_) => "encode error",
            };
            format!("{:2}  * ({})", ttl, marker)
        }
    }
}

fn peer_or_unknown(peer: Option<Ipv4Addr>) -> String {
    peer.map_or_else(|| String::from("*"), |p| p.to_string())
}

fn millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
