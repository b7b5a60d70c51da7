//! Zero-copy IPv4 header parser.
//!
//! Only the fields needed to key a flow and locate the transport header are
//! exposed: addresses, protocol, total length and fragment offset.

use super::{IpProtocol, ParseError};
use std::net::Ipv4Addr;

/// Minimum IPv4 header length (no options)
pub const IPV4_MIN_HEADER_LEN: usize = 20;

#[derive(Debug)]
pub struct Ipv4Header<'a> {
    data: &'a [u8],
    header_len: usize,
}

impl<'a> Ipv4Header<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        if data.len() < IPV4_MIN_HEADER_LEN {
            return Err(ParseError::TooShort {
                expected: IPV4_MIN_HEADER_LEN,
                actual: data.len(),
            });
        }

        let version = data[0] >> 4;
        if version != 4 {
            return Err(ParseError::InvalidHeader(format!(
                "expected IPv4 (version 4), got version {}",
                version
            )));
        }

        let header_len = (data[0] & 0x0F) as usize * 4;
        if header_len < IPV4_MIN_HEADER_LEN {
            return Err(ParseError::InvalidHeader(format!(
                "IHL too small: {} (min 5)",
                header_len / 4
            )));
        }
        if data.len() < header_len {
            return Err(ParseError::TooShort {
                expected: header_len,
                actual: data.len(),
            });
        }

        Ok(Ipv4Header { data, header_len })
    }

    #[inline]
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    /// Total length of the IP packet (header + payload) in bytes.
    #[inline]
    pub fn total_length(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// Fragment offset in 8-byte units.
    #[inline]
    pub fn fragment_offset(&self) -> u16 {
        u16::from_be_bytes([self.data[6] & 0x1F, self.data[7]])
    }

    #[inline]
    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data[9])
    }

    #[inline]
    pub fn src_addr(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.data[12], self.data[13], self.data[14], self.data[15])
    }

    #[inline]
    pub fn dst_addr(&self) -> Ipv4Addr {
        Ipv4Addr::new(self.data[16], self.data[17], self.data[18], self.data[19])
    }

    /// Payload after the header, clamped to `total_length` so Ethernet
    /// trailer padding never reaches the transport parser.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        let payload_len = (self.total_length() as usize).saturating_sub(self.header_len);
        let available = self.data.len() - self.header_len;
        let end = self.header_len + payload_len.min(available);
        &self.data[self.header_len..end]
    }
}
