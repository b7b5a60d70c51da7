//! Zero-copy UDP header parser (8 bytes: ports, length, checksum).

use super::ParseError;

pub const UDP_HEADER_LEN: usize = 8;

#[derive(Debug)]
pub struct UdpHeader<'a> {
    data: &'a [u8],
}

impl<'a> UdpHeader<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ParseError> {
        if data.len() < UDP_HEADER_LEN {
            return Err(ParseError::TooShort {
                expected: UDP_HEADER_LEN,
                actual: data.len(),
            });
        }
        Ok(UdpHeader { data })
    }

    #[inline]
    pub fn src_port(&self) -> u16 {
        u16::from_be_bytes([self.data[0], self.data[1]])
    }

    #[inline]
    pub fn dst_port(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]])
    }

    /// Datagram length (header + payload) as declared on the wire.
    #[inline]
    pub fn length(&self) -> u16 {
        u16::from_be_bytes([self.data[4], self.data[5]])
    }

    /// Payload, clamped to the declared length and to what was captured.
    #[inline]
    pub fn payload(&self) -> &'a [u8] {
        let payload_len = (self.length() as usize).saturating_sub(UDP_HEADER_LEN);
        let available = self.data.len() - UDP_HEADER_LEN;
        let end = UDP_HEADER_LEN + payload_len.min(available);
        &self.data[UDP_HEADER_LEN..end]
    }
}
