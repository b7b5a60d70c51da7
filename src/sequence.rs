//! Sequence-number strategies.
//!
//! TCP carries a sequence number natively. UDP does not, so traffic generators
//! such as iperf put a signed 32-bit big-endian counter at the start of every
//! datagram's payload.

use crate::capture::record::{PacketRecord, Transport};
use crate::flow::FlowProtocol;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Strategy requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequenceMode {
    Udp,
    Tcp,
    /// Use the transport of the first packet in each capture.
    Auto,
}

/// Strategy in effect for one capture file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceExtractor {
    Tcp,
    UdpEmbedded,
}

impl SequenceExtractor {
    /// Resolve the strategy for a capture whose first frame has transport `first`.
    ///
    /// Returns `None` when `mode` is `Auto` and the first frame is neither TCP
    /// nor UDP (or the capture is empty).
    pub fn select(mode: SequenceMode, first: Option<FlowProtocol>) -> Option<Self> {
        match mode {
            SequenceMode::Tcp => Some(SequenceExtractor::Tcp),
            SequenceMode::Udp => Some(SequenceExtractor::UdpEmbedded),
            SequenceMode::Auto => match first? {
                FlowProtocol::Tcp => Some(SequenceExtractor::Tcp),
                FlowProtocol::Udp => Some(SequenceExtractor::UdpEmbedded),
            },
        }
    }

    pub fn protocol(&self) -> FlowProtocol {
        match self {
            SequenceExtractor::Tcp => FlowProtocol::Tcp,
            SequenceExtractor::UdpEmbedded => FlowProtocol::Udp,
        }
    }

    /// Sequence number of `record`, or `None` if the packet must be skipped.
    pub fn extract(&self, record: &PacketRecord) -> Option<i64> {
        match (self, &record.transport) {
            (SequenceExtractor::Tcp, Transport::Tcp { seq }) => Some(i64::from(*seq)),
            (SequenceExtractor::UdpEmbedded, Transport::Udp) => {
                decode_embedded_sequence(&record.payload)
            }
            _ => None,
        }
    }
}

impl fmt::Display for SequenceExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceExtractor::Tcp => write!(f, "tcp"),
            SequenceExtractor::UdpEmbedded => write!(f, "udp (embedded sequence)"),
        }
    }
}

/// Read the leading signed big-endian i32 of a UDP payload.
///
/// Negative values and payloads shorter than 4 bytes yield `None`.
pub fn decode_embedded_sequence(payload: &[u8]) -> Option<i64> {
    let bytes: [u8; 4] = payload.get(..4)?.try_into().ok()?;
    let seq = i32::from_be_bytes(bytes);
    (seq >= 0).then_some(i64::from(seq))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Endpoint;
    use std::net::{IpAddr, Ipv4Addr};

    fn record(transport: Transport, payload: &[u8]) -> PacketRecord {
        let ip = IpAddr::V4(Ipv4Addr::LOCALHOST);
        PacketRecord {
            ts: 0.0,
            src: Endpoint { ip, port: 1 },
            dst: Endpoint { ip, port: 2 },
            transport,
            payload: payload.to_vec(),
        }
    }

    #[test]
    fn embedded_sequence_decoding() {
        assert_eq!(decode_embedded_sequence(&[0x00, 0x00, 0x00, 0x05]), Some(5));
        assert_eq!(decode_embedded_sequence(&[0xFF, 0xFF, 0xFF, 0xFF]), None);
        assert_eq!(decode_embedded_sequence(&[0x00, 0x00, 0x05]), None);
        assert_eq!(decode_embedded_sequence(&[]), None);
        assert_eq!(
            decode_embedded_sequence(&[0x7F, 0xFF, 0xFF, 0xFF, 0x01]),
            Some(i64::from(i32::MAX))
        );
    }

    #[test]
    fn tcp_uses_native_sequence() {
        let rec = record(Transport::Tcp { seq: u32::MAX }, &[]);
        assert_eq!(
            SequenceExtractor::Tcp.extract(&rec),
            Some(i64::from(u32::MAX))
        );
    }

    #[test]
    fn mismatched_transport_is_skipped() {
        let udp = record(Transport::Udp, &[0, 0, 0, 1]);
        let tcp = record(Transport::Tcp { seq: 1 }, &[0, 0, 0, 1]);
        assert_eq!(SequenceExtractor::Tcp.extract(&udp), None);
        assert_eq!(SequenceExtractor::UdpEmbedded.extract(&tcp), None);
        assert_eq!(SequenceExtractor::UdpEmbedded.extract(&udp), Some(1));
    }

    #[test]
    fn auto_mode_follows_first_packet() {
        assert_eq!(
            SequenceExtractor::select(SequenceMode::Auto, Some(FlowProtocol::Udp)),
            Some(SequenceExtractor::UdpEmbedded)
        );
        assert_eq!(
            SequenceExtractor::select(SequenceMode::Auto, Some(FlowProtocol::Tcp)),
            Some(SequenceExtractor::Tcp)
        );
        assert_eq!(SequenceExtractor::select(SequenceMode::Auto, None), None);
        assert_eq!(
            SequenceExtractor::select(SequenceMode::Tcp, None),
            Some(SequenceExtractor::Tcp)
        );
    }
}
