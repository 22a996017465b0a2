use crate::config::{TRACE_PAYLOAD, TraceConfig};
use crate::error::FailureReason;
use crate::exchange::{self, RECV_BUFFER_SIZE, Response};
use crate::packet::{EchoFields, MessageKind, WireMessage};
use crate::probe::{EchoRequest, OutcomeKind, ProbeOutcome};
use crate::transport::Transport;
use tracing::debug;

/// Discovers the path to a destination one TTL at a time.
///
/// A single transport is reused for every hop, its TTL is set before each send.
pub struct Tracer<T> {
    transport: T,
    config: TraceConfig,
    buf: Vec<u8>,
}

impl<T: Transport> Tracer<T> {
    pub fn new(transport: T, config: TraceConfig) -> Self {
        Tracer { transport, config, buf: vec![0; RECV_BUFFER_SIZE] }
    }

    /// Probe TTL 1, 2, ... until the destination answers with an echo reply or `max_hops` is exhausted.
    ///
    /// Returns the TTL at which the destination was reached, if it was.
    pub fn run<F: FnMut(&ProbeOutcome)>(&mut self, mut publish: F) -> Option<u8> {
        for ttl in 1..=self.config.max_hops {
            let outcome = self.probe(ttl);
            let reached = matches!(outcome.kind, OutcomeKind::EchoReply { .. });
            publish(&outcome);
            if reached {
                debug!(ttl, "destination reached");
                return Some(ttl);
            }
        }
        None
    }

    fn probe(&mut self, ttl: u8) -> ProbeOutcome {
        let slot = u16::from(ttl);
        let request = EchoRequest::new(self.config.identifier, slot, TRACE_PAYLOAD.to_vec());
        if let Err(err) = self.transport.set_ttl(ttl) {
            return ProbeOutcome::failed(slot, FailureReason::write(&err));
        }
        let config = self.config;
        let response = exchange::exchange(
            &mut self.transport,
            &mut self.buf,
            slot,
            &request,
            config.destination,
            config.timeout,
            |message| config.verify_identifier && is_stale(message, &config, slot),
        );
        let Response { message, peer, rtt } = match response {
            Ok(response) => response,
            Err(outcome) => {
                debug!(ttl, reason = ?outcome.failure(), "hop probe failed");
                return outcome;
            }
        };

        let kind = match message.kind {
            MessageKind::EchoReply(reply) => match self.foreign(Some(reply)) {
                Some(received) => OutcomeKind::Failed(FailureReason::IdentifierMismatch { received }),
                None => OutcomeKind::EchoReply { sequence: reply.sequence },
            },
            MessageKind::TimeExceeded { original } => match self.foreign(original) {
                Some(received) => OutcomeKind::Failed(FailureReason::IdentifierMismatch { received }),
                None => OutcomeKind::TimeExceeded,
            },
            MessageKind::Other => OutcomeKind::Unclassified { icmp_type: message.icmp_type, code: message.code },
        };
        let rtt = match kind {
            OutcomeKind::Failed(_) => None,
            _ => Some(rtt),
        };
        ProbeOutcome { slot, peer: Some(peer), rtt, bytes: message.len, kind }
    }

    // Only consulted when identifier verification is on, a missing quote is accepted.
    fn foreign(&self, fields: Option<EchoFields>) -> Option<u16> {
        let fields = fields.filter(|_| self.config.verify_identifier)?;
        (fields.identifier != self.config.identifier).then_some(fields.identifier.0)
    }
}

/// A late answer to one of our own requests for another TTL, the channel is shared across hops.
fn is_stale(message: &WireMessage, config: &TraceConfig, slot: u16) -> bool {
    message
        .echo_fields()
        .is_some_and(|fields| fields.identifier == config.identifier && fields.sequence != slot)
}
