use crate::error::FailureReason;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

/// The echo identifier shared by every request of one probe session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier(pub u16);

impl Identifier {
    /// Pick a fresh identifier for a new session.
    pub fn random() -> Self {
        Self(rand::random())
    }
}

impl From<u16> for Identifier {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An ICMP echo request, built fresh for every probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoRequest {
    identifier: Identifier,
    sequence: u16,
    payload: Vec<u8>,
}

impl EchoRequest {
    pub fn new(identifier: Identifier, sequence: u16, payload: Vec<u8>) -> Self {
        Self { identifier, sequence, payload }
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

/// The result of one probe slot, a ping sequence number or a traceroute TTL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Sequence number (ping) or TTL (traceroute) of the slot.
    pub slot: u16,
    pub peer: Option<Ipv4Addr>,
    pub rtt: Option<Duration>,
    /// Length of the received ICMP message, zero when nothing was read.
    pub bytes: usize,
    pub kind: OutcomeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeKind {
    /// An echo reply, carrying the sequence number found in the reply itself.
    EchoReply { sequence: u16 },
    /// A router on the path dropped the probe when its TTL ran out.
    TimeExceeded,
    /// Some other ICMP message was received, the hop answered but is not classified.
    Unclassified { icmp_type: u8, code: u8 },
    Failed(FailureReason),
}

impl ProbeOutcome {
    pub(crate) fn failed(slot: u16, reason: FailureReason) -> Self {
        Self { slot, peer: None, rtt: None, bytes: 0, kind: OutcomeKind::Failed(reason) }
    }

    pub(crate) fn failed_from(slot: u16, peer: Ipv4Addr, bytes: usize, reason: FailureReason) -> Self {
        Self { slot, peer: Some(peer), rtt: None, bytes, kind: OutcomeKind::Failed(reason) }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self.kind, OutcomeKind::Failed(_))
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.kind {
            OutcomeKind::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}
