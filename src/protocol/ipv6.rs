//! Zero-copy IPv6 fixed-header parser (40 bytes).
//!
//! Extension headers are not walked: a packet whose next header is not TCP or
//! UDP simply yields no transport layer.

use super::{IpProtocol, ParseError};
use std::net::Ipv6Addr;

pub const IPV6_HEADER_LEN: usize = 40;

#[derive(Debug)]
pub struct Ipv6Header<'a> {
    data: &'a [u8],
}

impl<'a> Ipv6Header<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        if data.len() < IPV6_HEADER_LEN {
            return Err(ParseError::TooShort {
                expected: IPV6_HEADER_LEN,
                actual: data.len(),
            });
        }

        let version = data[0] >> 4;
        if version != 6 {
            return Err(ParseError::InvalidHeader(format!(
                "expected IPv6 (version 6), got version {}",
                version
            )));
        }

        Ok(Ipv6Header { data })
    }

    /// Payload length (not including the fixed header).
    #[inline]
    pub fn payload_length(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    #[inline]
    pub fn next_header(&self) -> IpProtocol {
        IpProtocol::from(self.data[6])
    }

    #[inline]
    pub fn src_addr(&self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&self.data[8..24]);
        Ipv6Addr::from(octets)
    }

    #[inline]
    pub fn dst_addr(&self) -> Ipv6Addr {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&self.data[24..40]);
        Ipv6Addr::from(octets)
    }

    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        let payload_len = self.payload_length() as usize;
        let available = self.data.len() - IPV6_HEADER_LEN;
        let end = IPV6_HEADER_LEN + payload_len.min(available);
        &self.data[IPV6_HEADER_LEN..end]
    }
}
