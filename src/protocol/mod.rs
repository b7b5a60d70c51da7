pub mod ethernet;
pub mod ipv4;
pub mod ipv6;
pub mod sll;
pub mod tcp;
pub mod udp;

use std::fmt;
use std::net::IpAddr;

/// EtherType values the frame decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Ipv6,
    VlanTagged,
    Unknown(u16),
}

impl From<u16> for EtherType {
    fn from(value: u16) -> Self {
        match value {
            0x0800 => EtherType::Ipv4,
            0x86DD => EtherType::Ipv6,
            0x8100 => EtherType::VlanTagged,
            other => EtherType::Unknown(other),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::Ipv4 => write!(f, "IPv4"),
            EtherType::Ipv6 => write!(f, "IPv6"),
            EtherType::VlanTagged => write!(f, "802.1Q VLAN"),
            EtherType::Unknown(v) => write!(f, "Unknown(0x{:04x})", v),
        }
    }
}

/// IP protocol numbers relevant to delay extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpProtocol {
    Tcp,
    Udp,
    Unknown(u8),
}

impl From<u8> for IpProtocol {
    fn from(value: u8) -> Self {
        match value {
            6 => IpProtocol::Tcp,
            17 => IpProtocol::Udp,
            other => IpProtocol::Unknown(other),
        }
    }
}

impl fmt::Display for IpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpProtocol::Tcp => write!(f, "TCP"),
            IpProtocol::Udp => write!(f, "UDP"),
            IpProtocol::Unknown(v) => write!(f, "Proto({})", v),
        }
    }
}

/// Errors from protocol parsing
#[derive(Debug)]
pub enum ParseError {
    /// Not enough bytes to parse the header
    TooShort { expected: usize, actual: usize },
    /// Invalid header values
    InvalidHeader(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TooShort { expected, actual } => {
                write!(f, "packet too short: need {} bytes, got {}", expected, actual)
            }
            ParseError::InvalidHeader(msg) => write!(f, "invalid header: {}", msg),
        }
    }
}

impl std::error::Error for ParseError {}

/// Link-layer framing of a capture file, derived from its pcap link type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkLayer {
    Ethernet,
    /// Linux "cooked" capture (SLL), produced when capturing on `any`.
    LinuxCooked,
    /// Bare IPv4/IPv6 packets without a link header.
    RawIp,
}

impl LinkLayer {
    /// Map a pcap `LINKTYPE_*` / `DLT_*` value to a supported framing.
    pub fn from_linktype(linktype: i32) -> Option<Self> {
        match linktype {
            1 => Some(LinkLayer::Ethernet),
            113 => Some(LinkLayer::LinuxCooked),
            12 | 14 | 101 | 228 | 229 => Some(LinkLayer::RawIp),
            _ => None,
        }
    }
}

/// A parsed frame, referencing the original byte slice
#[derive(Debug)]
pub struct ParsedPacket<'a> {
    pub network: Option<NetworkHeader<'a>>,
    pub transport: Option<TransportHeader<'a>>,
    pub payload: &'a [u8],
}

/// Network layer header
#[derive(Debug)]
pub enum NetworkHeader<'a> {
    Ipv4(ipv4::Ipv4Header<'a>),
    Ipv6(ipv6::Ipv6Header<'a>),
}

impl<'a> NetworkHeader<'a> {
    pub fn src_ip(&self) -> IpAddr {
        match self {
            NetworkHeader::Ipv4(h) => IpAddr::V4(h.src_addr()),
            NetworkHeader::Ipv6(h) => IpAddr::V6(h.src_addr()),
        }
    }

    pub fn dst_ip(&self) -> IpAddr {
        match self {
            NetworkHeader::Ipv4(h) => IpAddr::V4(h.dst_addr()),
            NetworkHeader::Ipv6(h) => IpAddr::V6(h.dst_addr()),
        }
    }

    /// True for IPv4 fragments past the first one; those carry no transport header.
    pub fn is_trailing_fragment(&self) -> bool {
        match self {
            NetworkHeader::Ipv4(h) => h.fragment_offset() != 0,
            NetworkHeader::Ipv6(_) => false,
        }
    }
}

/// Transport layer header
#[derive(Debug)]
pub enum TransportHeader<'a> {
    Tcp(tcp::TcpHeader<'a>),
    Udp(udp::UdpHeader<'a>),
}

/// Parse a captured frame according to the capture's link layer.
pub fn parse_frame(link: LinkLayer, data: &[u8]) -> Result<ParsedPacket<'_>, ParseError> {
    match link {
        LinkLayer::Ethernet => parse_packet(data),
        LinkLayer::LinuxCooked => {
            let sll = sll::SllHeader::parse(data)?;
            parse_network(sll.protocol(), sll.payload())
        }
        LinkLayer::RawIp => {
            let ether_type = match data.first().map(|b| b >> 4) {
                Some(4) => EtherType::Ipv4,
                Some(6) => EtherType::Ipv6,
                Some(v) => {
                    return Err(ParseError::InvalidHeader(format!(
                        "raw IP frame with version {}",
                        v
                    )))
                }
                None => {
                    return Err(ParseError::TooShort {
                        expected: 1,
                        actual: 0,
                    })
                }
            };
            parse_network(ether_type, data)
        }
    }
}

/// Parse an Ethernet frame from raw bytes.
pub fn parse_packet(data: &[u8]) -> Result<ParsedPacket<'_>, ParseError> {
    // Layer 2: Ethernet
    let eth = ethernet::EthernetHeader::parse(data)?;
    let mut remaining = eth.payload();
    let mut ether_type = eth.ether_type();

    // Skip a single 802.1Q tag
    if ether_type == EtherType::VlanTagged {
        if remaining.len() < 4 {
            return Err(ParseError::TooShort {
                expected: 4,
                actual: remaining.len(),
            });
        }
        ether_type = EtherType::from(u16::from_be_bytes([remaining[2], remaining[3]]));
        remaining = &remaining[4..];
    }

    parse_network(ether_type, remaining)
}

fn parse_network(
    ether_type: EtherType,
    data: &[u8],
) -> Result<ParsedPacket<'_>, ParseError> {
    // Layer 3: Network
    let (network, l4_data) = match ether_type {
        EtherType::Ipv4 => {
            let hdr = ipv4::Ipv4Header::parse(data)?;
            let payload = hdr.payload();
            (Some(NetworkHeader::Ipv4(hdr)), payload)
        }
        EtherType::Ipv6 => {
            let hdr = ipv6::Ipv6Header::parse(data)?;
            let payload = hdr.payload();
            (Some(NetworkHeader::Ipv6(hdr)), payload)
        }
        _ => (None, data),
    };

    let ip_proto = match &network {
        Some(net) if net.is_trailing_fragment() => None,
        Some(NetworkHeader::Ipv4(hdr)) => Some(hdr.protocol()),
        Some(NetworkHeader::Ipv6(hdr)) => Some(hdr.next_header()),
        None => None,
    };

    // Layer 4: Transport
    let (transport, payload) = match ip_proto {
        Some(IpProtocol::Tcp) => match tcp::TcpHeader::parse(l4_data) {
            Ok(hdr) => {
                let payload = hdr.payload();
                (Some(TransportHeader::Tcp(hdr)), payload)
            }
            Err(_) => (None, l4_data),
        },
        Some(IpProtocol::Udp) => match udp::UdpHeader::parse(l4_data) {
            Ok(hdr) => {
                let payload = hdr.payload();
                (Some(TransportHeader::Udp(hdr)), payload)
            }
            Err(_) => (None, l4_data),
        },
        _ => (None, l4_data),
    };

    Ok(ParsedPacket {
        network,
        transport,
        payload,
    })
}
