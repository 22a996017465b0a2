use crate::error::{ProbeError, ProbeResult};
use pnet::packet::Packet;
use pnet::packet::icmp::IcmpPacket;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::transport::TransportChannelType::Layer4;
use pnet::transport::TransportProtocol::Ipv4;
use pnet::transport::{TransportReceiver, TransportSender, icmp_packet_iter, transport_channel};
use std::io;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Large enough for any IPv4 datagram, oversized replies are never cut short.
const CHANNEL_BUFFER_SIZE: usize = 65535;

/// A channel able to send ICMP messages and receive ICMP messages addressed to this host.
///
/// Received messages are returned without their IPv4 header.
pub trait Transport {
    /// Send `packet` to `destination`, returning the number of bytes written.
    fn send_to(&mut self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize>;

    /// Set the IP time-to-live used for subsequent sends.
    fn set_ttl(&mut self, ttl: u8) -> io::Result<()>;

    /// Bound every subsequent `receive` by `deadline`.
    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()>;

    /// Receive the next ICMP message into `buf`.
    ///
    /// Returns `None` once the read deadline has passed.
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, Ipv4Addr)>>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send_to(&mut self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        (**self).send_to(packet, destination)
    }

    fn set_ttl(&mut self, ttl: u8) -> io::Result<()> {
        (**self).set_ttl(ttl)
    }

    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        (**self).set_read_deadline(deadline)
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, Ipv4Addr)>> {
        (**self).receive(buf)
    }
}

/// A raw IPv4 ICMP channel.
///
/// The socket is unbound, it receives ICMP traffic for every local address and is closed on drop.
pub struct IcmpChannel {
    transport_sender: TransportSender,
    transport_receiver: TransportReceiver,
    deadline: Option<Instant>,
}

impl IcmpChannel {
    /// Open the channel. This requires root or the `CAP_NET_RAW` capability.
    pub fn open() -> ProbeResult<Self> {
        let (transport_sender, transport_receiver) =
            transport_channel(CHANNEL_BUFFER_SIZE, Layer4(Ipv4(IpNextHeaderProtocols::Icmp)))
                .map_err(ProbeError::TransportUnavailable)?;
        debug!("opened raw ICMP channel");
        Ok(IcmpChannel { transport_sender, transport_receiver, deadline: None })
    }
}

impl Transport for IcmpChannel {
    fn send_to(&mut self, packet: &[u8], destination: Ipv4Addr) -> io::Result<usize> {
        let icmp_packet = IcmpPacket::new(packet)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "packet shorter than an ICMP header"))?;
        self.transport_sender.send_to(icmp_packet, IpAddr::V4(destination))
    }

    fn set_ttl(&mut self, ttl: u8) -> io::Result<()> {
        self.transport_sender.set_ttl(ttl)
    }

    fn set_read_deadline(&mut self, deadline: Instant) -> io::Result<()> {
        self.deadline = Some(deadline);
        Ok(())
    }

    fn receive(&mut self, buf: &mut [u8]) -> io::Result<Option<(usize, Ipv4Addr)>> {
        let mut packets = icmp_packet_iter(&mut self.transport_receiver);
        loop {
            let received = match self.deadline {
                Some(deadline) => match time_left(deadline, Instant::now()) {
                    Some(remaining) => packets.next_with_timeout(remaining)?,
                    None => return Ok(None),
                },
                None => Some(packets.next()?),
            };
            match received {
                Some((icmp_packet, IpAddr::V4(peer))) => {
                    let data = icmp_packet.packet();
                    let len = data.len().min(buf.len());
                    buf[..len].copy_from_slice(&data[..len]);
                    return Ok(Some((len, peer)));
                }
                Some((_, peer)) => trace!(%peer, "ignoring non IPv4 datagram"),
                None => return Ok(None),
            }
        }
    }
}

/// Time remaining until `deadline`, `None` once it has passed.
fn time_left(deadline: Instant, now: Instant) -> Option<Duration> {
    Some(deadline.saturating_duration_since(now)).filter(|remaining| !remaining.is_zero())
}

/// Resolve a hostname or a literal address to an IPv4 address.
pub fn resolve(host: &str) -> ProbeResult<Ipv4Addr> {
    if let Ok(address) = host.parse::<Ipv4Addr>() {
        return Ok(address);
    }
    let addresses = dns_lookup::lookup_host(host)
        .map_err(|source| ProbeError::Resolution { host: host.to_string(), source })?;
    let address = addresses
        .into_iter()
        .find_map(|address| match address {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| ProbeError::Resolution {
            host: host.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no IPv4 address found"),
        })?;
    debug!(host, %address, "resolved destination");
    Ok(address)
}
