use crate::config::PingConfig;
use crate::error::FailureReason;
use crate::exchange::{self, RECV_BUFFER_SIZE, Response};
use crate::packet::MessageKind;
use crate::probe::{EchoRequest, OutcomeKind, ProbeOutcome};
use crate::transport::Transport;
use std::thread;
use tracing::debug;

/// Sends `count` echo requests to one destination and reports each round trip.
pub struct Pinger<T> {
    transport: T,
    config: PingConfig,
    buf: Vec<u8>,
}

impl<T: Transport> Pinger<T> {
    pub fn new(transport: T, config: PingConfig) -> Self {
        Pinger { transport, config, buf: vec![0; RECV_BUFFER_SIZE] }
    }

    /// Run every probe of the session in order, publishing one outcome per sequence number.
    ///
    /// Failed probes never end the run early, the interval is still observed after them.
    pub fn run<F: FnMut(&ProbeOutcome)>(&mut self, mut publish: F) {
        for sequence in 1..=self.config.count {
            let outcome = self.probe(sequence);
            publish(&outcome);
            if sequence < self.config.count {
                thread::sleep(self.config.interval);
            }
        }
    }

    fn probe(&mut self, sequence: u16) -> ProbeOutcome {
        let payload = vec![sequence as u8; self.config.payload_size];
        let request = EchoRequest::new(self.config.identifier, sequence, payload);
        let response = exchange::exchange(
            &mut self.transport,
            &mut self.buf,
            sequence,
            &request,
            self.config.destination,
            self.config.timeout,
            |_| false,
        );
        let Response { message, peer, rtt } = match response {
            Ok(response) => response,
            Err(outcome) => {
                debug!(sequence, reason = ?outcome.failure(), "probe failed");
                return outcome;
            }
        };

        let reason = match message.kind {
            MessageKind::EchoReply(reply) if reply.identifier == self.config.identifier => {
                return ProbeOutcome {
                    slot: sequence,
                    peer: Some(peer),
                    rtt: Some(rtt),
                    bytes: message.len,
                    kind: OutcomeKind::EchoReply { sequence: reply.sequence },
                };
            }
            MessageKind::EchoReply(reply) => FailureReason::IdentifierMismatch { received: reply.identifier.0 },
            MessageKind::TimeExceeded { .. } | MessageKind::Other => FailureReason::UnexpectedType {
                icmp_type: message.icmp_type,
                code: message.code,
            },
        };
        debug!(sequence, %peer, %reason, "reply rejected");
        ProbeOutcome::failed_from(sequence, peer, message.len, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::tests::{echo_reply, time_exceeded};
    use crate::probe::Identifier;
    use crate::transport::testing::{Reply, ScriptedTransport};
    use std::io;
    use std::net::Ipv4Addr;
    use std::time::{Duration, Instant};
    use test_case::test_case;

    const ID: u16 = 0x4242;
    const LOCALHOST: Ipv4Addr = Ipv4Addr::LOCALHOST;

    fn config(count: u16, payload_size: usize) -> PingConfig {
        PingConfig {
            destination: LOCALHOST,
            identifier: Identifier(ID),
            count,
            payload_size,
            interval: Duration::ZERO,
            timeout: Duration::from_millis(50),
        }
    }

    fn reply(sequence: u16) -> Reply {
        Reply::Datagram(echo_reply(ID, sequence, &[sequence as u8; 16]), LOCALHOST)
    }

    fn run(transport: &mut ScriptedTransport, config: PingConfig) -> Vec<ProbeOutcome> {
        let mut outcomes = vec![];
        Pinger::new(transport, config).run(|outcome| outcomes.push(outcome.clone()));
        outcomes
    }

    #[test]
    fn test_successful_run() {
        let mut transport = ScriptedTransport::new([reply(1), reply(2), reply(3)]);
        let outcomes = run(&mut transport, config(3, 16));
        assert_eq!(3, outcomes.len());
        for (outcome, sequence) in outcomes.iter().zip(1..) {
            assert_eq!(sequence, outcome.slot);
            assert_eq!(OutcomeKind::EchoReply { sequence }, outcome.kind);
            assert_eq!(Some(LOCALHOST), outcome.peer);
            assert_eq!(24, outcome.bytes);
            assert!(outcome.rtt.is_some());
        }
    }

    #[test]
    fn test_sequence_numbers_have_no_gaps_despite_failures() {
        let mut transport = ScriptedTransport::new([
            Reply::Timeout,
            reply(3),
            Reply::Datagram(vec![0], LOCALHOST),
            Reply::Error(io::ErrorKind::ConnectionReset),
        ])
        .failing_sends(&[2]);
        let outcomes = run(&mut transport, config(5, 8));

        let slots: Vec<u16> = outcomes.iter().map(|o| o.slot).collect();
        assert_eq!(vec![1, 2, 3, 4, 5], slots);
        let sent: Vec<u16> = transport.sent.iter().map(|s| u16::from_be_bytes([s.packet[6], s.packet[7]])).collect();
        assert_eq!(vec![1, 2, 3, 4, 5], sent);

        assert_eq!(Some(&FailureReason::Timeout), outcomes[0].failure());
        assert!(matches!(outcomes[1].failure(), Some(FailureReason::WriteError(_))));
        assert!(outcomes[2].is_success());
        assert!(matches!(outcomes[3].failure(), Some(FailureReason::ParseError(_))));
        assert!(matches!(outcomes[4].failure(), Some(FailureReason::ReadError(_))));
    }

    #[test]
    fn test_zero_count_sends_nothing() {
        let mut transport = ScriptedTransport::new([reply(1)]);
        let outcomes = run(&mut transport, config(0, 56));
        assert!(outcomes.is_empty());
        assert!(transport.sent.is_empty());
    }

    #[test]
    fn test_foreign_identifier_is_never_success() {
        let foreign = Reply::Datagram(echo_reply(ID + 1, 1, &[]), LOCALHOST);
        let mut transport = ScriptedTransport::new([foreign, reply(1)]);
        let outcomes = run(&mut transport, config(1, 0));
        assert_eq!(1, outcomes.len());
        assert_eq!(Some(&FailureReason::IdentifierMismatch { received: ID + 1 }), outcomes[0].failure());
        assert_eq!(Some(LOCALHOST), outcomes[0].peer);
        assert_eq!(1, transport.remaining_replies());
    }

    #[test]
    fn test_unexpected_type() {
        let peer = Ipv4Addr::new(10, 0, 0, 1);
        let mut transport = ScriptedTransport::new([Reply::Datagram(time_exceeded(ID, 1), peer)]);
        let outcomes = run(&mut transport, config(1, 0));
        assert_eq!(
            Some(&FailureReason::UnexpectedType { icmp_type: 11, code: 0 }),
            outcomes[0].failure()
        );
        assert_eq!(Some(peer), outcomes[0].peer);
    }

    #[test]
    fn test_interval_skipped_after_last_sequence() {
        let mut transport = ScriptedTransport::default().failing_sends(&[1, 2, 3]);
        let config = PingConfig { interval: Duration::from_millis(40), ..config(3, 0) };
        let start = Instant::now();
        let outcomes = run(&mut transport, config);
        let elapsed = start.elapsed();
        assert_eq!(3, outcomes.len());
        assert!(outcomes.iter().all(|o| matches!(o.failure(), Some(FailureReason::WriteError(_)))));
        assert!(elapsed >= Duration::from_millis(80), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(120), "elapsed {elapsed:?}");
    }

    #[test]
    fn test_own_echo_request_is_skipped() {
        let looped = crate::packet::encode(&EchoRequest::new(Identifier(ID), 1, vec![1; 4])).unwrap();
        let mut transport = ScriptedTransport::new([Reply::Datagram(looped, LOCALHOST), reply(1)]);
        let outcomes = run(&mut transport, config(1, 4));
        assert_eq!(1, outcomes.len());
        assert_eq!(OutcomeKind::EchoReply { sequence: 1 }, outcomes[0].kind);
    }

    #[test]
    fn test_only_own_echo_request_times_out() {
        let looped = crate::packet::encode(&EchoRequest::new(Identifier(ID), 1, vec![])).unwrap();
        let mut transport = ScriptedTransport::new([Reply::Datagram(looped, LOCALHOST)]);
        let outcomes = run(&mut transport, config(1, 0));
        assert_eq!(vec![ProbeOutcome::failed(1, FailureReason::Timeout)], outcomes);
    }

    #[test]
    fn test_reply_sequence_is_reported() {
        let mut transport = ScriptedTransport::new([reply(9)]);
        let outcomes = run(&mut transport, config(1, 0));
        assert_eq!(1, outcomes[0].slot);
        assert_eq!(OutcomeKind::EchoReply { sequence: 9 }, outcomes[0].kind);
    }

    #[test_case(0; "empty payload")]
    #[test_case(56; "default payload")]
    #[test_case(2000; "oversized payload")]
    fn test_payload_size(size: usize) {
        let mut transport = ScriptedTransport::new([reply(1), reply(2)]);
        run(&mut transport, config(2, size));
        for (sent, sequence) in transport.sent.iter().zip(1u8..) {
            assert_eq!(8 + size, sent.packet.len());
            assert!(sent.packet[8..].iter().all(|b| *b == sequence));
            assert_eq!(LOCALHOST, sent.destination);
            assert_eq!(None, sent.ttl);
        }
    }

    #[test]
    fn test_deadline_is_armed_per_probe() {
        let mut transport = ScriptedTransport::default();
        let before = Instant::now();
        let outcomes = run(&mut transport, config(3, 0));
        assert_eq!(3, transport.deadlines.len());
        assert!(transport.deadlines.iter().all(|d| *d >= before + Duration::from_millis(50)));
        assert!(outcomes.iter().all(|o| o.failure() == Some(&FailureReason::Timeout)));
    }
}
