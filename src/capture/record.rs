//! Owned per-packet records handed from the capture reader to the flow table.

use crate::flow::{Endpoint, FlowProtocol};
use crate::protocol::{ParsedPacket, TransportHeader};

/// Transport layer of a record, with the fields sequence extraction needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tcp { seq: u32 },
    Udp,
}

impl Transport {
    pub fn protocol(&self) -> FlowProtocol {
        match self {
            Transport::Tcp { .. } => FlowProtocol::Tcp,
            Transport::Udp => FlowProtocol::Udp,
        }
    }
}

/// A decoded TCP or UDP packet with its capture timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketRecord {
    /// Capture timestamp in seconds since the epoch.
    pub ts: f64,
    pub src: Endpoint,
    pub dst: Endpoint,
    pub transport: Transport,
    /// Transport payload (TCP segment data / UDP datagram body).
    pub payload: Vec<u8>,
}

impl PacketRecord {
    /// Build a record from a parsed frame. Frames without an IP network layer
    /// or without a TCP/UDP header yield `None`.
    pub fn from_parsed(ts: f64, packet: &ParsedPacket<'_>) -> Option<Self> {
        let network = packet.network.as_ref()?;
        let (src_port, dst_port, transport) = match packet.transport.as_ref()? {
            TransportHeader::Tcp(hdr) => (
                hdr.src_port(),
                hdr.dst_port(),
                Transport::Tcp {
                    seq: hdr.sequence_number(),
                },
            ),
            TransportHeader::Udp(hdr) => (hdr.src_port(), hdr.dst_port(), Transport::Udp),
        };

        Some(PacketRecord {
            ts,
            src: Endpoint {
                ip: network.src_ip(),
                port: src_port,
            },
            dst: Endpoint {
                ip: network.dst_ip(),
                port: dst_port,
            },
            transport,
            payload: packet.payload.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{parse_frame, LinkLayer};
    use std::net::{IpAddr, Ipv4Addr};

    fn raw_tcp(seq: u32, payload: &[u8]) -> Vec<u8> {
        let total = 40 + payload.len();
        let mut pkt = vec![0u8; 40];
        pkt[0] = 0x45;
        pkt[2..4].copy_from_slice(&(total as u16).to_be_bytes());
        pkt[9] = 6;
        pkt[12..16].copy_from_slice(&[192, 168, 0, 1]);
        pkt[16..20].copy_from_slice(&[192, 168, 0, 2]);
        pkt[20..22].copy_from_slice(&40000u16.to_be_bytes());
        pkt[22..24].copy_from_slice(&443u16.to_be_bytes());
        pkt[24..28].copy_from_slice(&seq.to_be_bytes());
        pkt[32] = 0x50;
        pkt.extend_from_slice(payload);
        pkt
    }

    #[test]
    fn record_from_tcp_frame() {
        let pkt = raw_tcp(77, b"abc");
        let parsed = parse_frame(LinkLayer::RawIp, &pkt).unwrap();
        let record = PacketRecord::from_parsed(1.5, &parsed).unwrap();
        assert_eq!(record.ts, 1.5);
        assert_eq!(record.src.ip, IpAddr::V4(Ipv4Addr::new(192, 168, 0, 1)));
        assert_eq!(record.src.port, 40000);
        assert_eq!(record.dst.port, 443);
        assert_eq!(record.transport, Transport::Tcp { seq: 77 });
        assert_eq!(record.transport.protocol(), FlowProtocol::Tcp);
        assert_eq!(record.payload, b"abc");
    }

    #[test]
    fn non_transport_frame_has_no_record() {
        let mut pkt = raw_tcp(1, &[]);
        pkt[9] = 1; // ICMP
        let parsed = parse_frame(LinkLayer::RawIp, &pkt).unwrap();
        assert!(PacketRecord::from_parsed(0.0, &parsed).is_none());
    }
}
