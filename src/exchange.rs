use crate::error::FailureReason;
use crate::packet::{self, WireMessage};
use crate::probe::{EchoRequest, ProbeOutcome};
use crate::transport::Transport;
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Receive buffer size, the largest ICMP message an IPv4 datagram can carry.
pub(crate) const RECV_BUFFER_SIZE: usize = 65535;

/// A decoded reply to one probe.
#[derive(Debug)]
pub(crate) struct Response {
    pub message: WireMessage,
    pub peer: Ipv4Addr,
    pub rtt: Duration,
}

/// Send `request` and wait up to `timeout` for the first ICMP message that is neither an echo
/// request nor `stale`.
///
/// Timing starts just before the send. Any failure comes back as the finished outcome for `slot`.
pub(crate) fn exchange<T: Transport>(
    transport: &mut T,
    buf: &mut [u8],
    slot: u16,
    request: &EchoRequest,
    destination: Ipv4Addr,
    timeout: Duration,
    stale: impl Fn(&WireMessage) -> bool,
) -> Result<Response, ProbeOutcome> {
    let packet = packet::encode(request).map_err(|err| ProbeOutcome::failed(slot, err.into()))?;

    let start = Instant::now();
    transport
        .set_read_deadline(start + timeout)
        .map_err(|err| ProbeOutcome::failed(slot, FailureReason::read(&err)))?;
    let written = transport
        .send_to(&packet, destination)
        .map_err(|err| ProbeOutcome::failed(slot, FailureReason::write(&err)))?;
    debug!(slot, written, %destination, "sent echo request");

    loop {
        let (len, peer) = match transport.receive(buf) {
            Ok(Some(received)) => received,
            Ok(None) => return Err(ProbeOutcome::failed(slot, FailureReason::Timeout)),
            Err(err) => return Err(ProbeOutcome::failed(slot, FailureReason::read(&err))),
        };
        let rtt = start.elapsed();
        let message = packet::decode(&buf[..len])
            .map_err(|err| ProbeOutcome::failed_from(slot, peer, len, err.into()))?;
        if message.is_echo_request() {
            trace!(slot, %peer, "skipping looped back echo request");
            continue;
        }
        if stale(&message) {
            debug!(slot, %peer, "skipping late reply to an earlier request");
            continue;
        }
        debug!(slot, %peer, icmp_type = message.icmp_type, code = message.code, ?rtt, "received reply");
        return Ok(Response { message, peer, rtt });
    }
}
