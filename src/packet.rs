use crate::error::{EncodeError, ParseError};
use crate::probe::{EchoRequest, Identifier};
use pnet::packet::Packet;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet::packet::icmp::time_exceeded::TimeExceededPacket;
use pnet::packet::icmp::{IcmpCode, IcmpPacket, IcmpTypes, checksum};
use pnet::packet::ipv4::Ipv4Packet;

/// A received ICMP message, classified by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireMessage {
    pub kind: MessageKind,
    pub icmp_type: u8,
    pub code: u8,
    /// Length of the ICMP message as received.
    pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    EchoReply(EchoFields),
    /// `original` holds the fields of the echo request quoted by the router, when present.
    TimeExceeded { original: Option<EchoFields> },
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoFields {
    pub identifier: Identifier,
    pub sequence: u16,
}

impl WireMessage {
    /// Echo requests show up on a raw socket when probing a local address: they are our own probes.
    pub fn is_echo_request(&self) -> bool {
        self.kind == MessageKind::Other && self.icmp_type == IcmpTypes::EchoRequest.0
    }

    /// The echo identifier and sequence this message answers, when it carries them.
    pub fn echo_fields(&self) -> Option<EchoFields> {
        match self.kind {
            MessageKind::EchoReply(fields) => Some(fields),
            MessageKind::TimeExceeded { original } => original,
            MessageKind::Other => None,
        }
    }
}

/// Serialize an echo request, header checksum included.
pub fn encode(request: &EchoRequest) -> Result<Vec<u8>, EncodeError> {
    let mut buf = vec![0u8; EchoRequestPacket::minimum_packet_size() + request.payload().len()];
    let len = buf.len();
    {
        let mut echo_packet = MutableEchoRequestPacket::new(&mut buf).ok_or(EncodeError::BufferTooSmall(len))?;

        echo_packet.set_icmp_type(IcmpTypes::EchoRequest);
        echo_packet.set_icmp_code(IcmpCode::new(0));
        echo_packet.set_identifier(request.identifier().0);
        echo_packet.set_sequence_number(request.sequence());
        echo_packet.set_payload(request.payload());

        let echo_checksum = checksum(&IcmpPacket::new(echo_packet.packet()).ok_or(EncodeError::BufferTooSmall(len))?);
        echo_packet.set_checksum(echo_checksum);
    }
    Ok(buf)
}

/// Parse an IPv4 ICMP message, the IP header already stripped.
pub fn decode(bytes: &[u8]) -> Result<WireMessage, ParseError> {
    let icmp_packet = IcmpPacket::new(bytes).ok_or(ParseError::Truncated {
        expected: IcmpPacket::minimum_packet_size(),
        actual: bytes.len(),
    })?;
    let icmp_type = icmp_packet.get_icmp_type();
    let code = icmp_packet.get_icmp_code().0;

    let kind = match icmp_type {
        IcmpTypes::EchoReply => {
            let reply = EchoReplyPacket::new(bytes).ok_or(ParseError::Truncated {
                expected: EchoReplyPacket::minimum_packet_size(),
                actual: bytes.len(),
            })?;
            MessageKind::EchoReply(EchoFields {
                identifier: Identifier(reply.get_identifier()),
                sequence: reply.get_sequence_number(),
            })
        }
        IcmpTypes::TimeExceeded => MessageKind::TimeExceeded { original: quoted_echo_request(bytes) },
        _ => MessageKind::Other,
    };

    Ok(WireMessage { kind, icmp_type: icmp_type.0, code, len: bytes.len() })
}

// Time exceeded carries the original IPv4 header followed by the first 8 bytes of our request.
fn quoted_echo_request(bytes: &[u8]) -> Option<EchoFields> {
    let time_exceeded = TimeExceededPacket::new(bytes)?;
    let quoted = time_exceeded.payload();
    let ipv4 = Ipv4Packet::new(quoted)?;
    let header_len = usize::from(ipv4.get_header_length()) * 4;
    let original = EchoRequestPacket::new(quoted.get(header_len..)?)?;
    if original.get_icmp_type() != IcmpTypes::EchoRequest {
        return None;
    }
    Some(EchoFields {
        identifier: Identifier(original.get_identifier()),
        sequence: original.get_sequence_number(),
    })
}
