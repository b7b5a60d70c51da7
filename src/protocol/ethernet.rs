//! Zero-copy Ethernet II header.
//!
//! Layout: destination MAC (6), source MAC (6), EtherType (2), payload.
//! 802.1Q tags are peeled off by the caller.

use super::{EtherType, ParseError};

/// Ethernet header length without VLAN tags
pub const ETH_HEADER_LEN: usize = 14;

#[derive(Debug)]
pub struct EthernetHeader<'a> {
    data: &'a [u8],
}

impl<'a> EthernetHeader<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        if data.len() < ETH_HEADER_LEN {
            return Err(ParseError::TooShort {
                expected: ETH_HEADER_LEN,
                actual: data.len(),
            });
        }
        Ok(EthernetHeader { data })
    }

    #[inline]
    pub fn ether_type(&self) -> EtherType {
        EtherType::from(u16::from_be_bytes([self.data[12], self.data[13]]))
    }

    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        &self.data[ETH_HEADER_LEN..]
    }
}
