//! Linux cooked capture (SLL) header, as written by `tcpdump -i any`.
//!
//! Layout (16 bytes):
//!   packet type (2) | ARPHRD type (2) | address length (2)
//!   link-layer address (8) | protocol / EtherType (2)

use super::{EtherType, ParseError};

pub const SLL_HEADER_LEN: usize = 16;

#[derive(Debug)]
pub struct SllHeader<'a> {
    data: &'a [u8],
}

impl<'a> SllHeader<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        if data.len() < SLL_HEADER_LEN {
            return Err(ParseError::TooShort {
                expected: SLL_HEADER_LEN,
                actual: data.len(),
            });
        }
        Ok(SllHeader { data })
    }

    #[inline]
    pub fn protocol(&self) -> EtherType {
        EtherType::from(u16::from_be_bytes([self.data[14], self.data[15]]))
    }

    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        &self.data[SLL_HEADER_LEN..]
    }
}
