//! Capture file input.
//!
//! Reads offline pcap files through the `pcap` crate and turns each TCP or
//! UDP frame into an owned [`record::PacketRecord`].

pub mod engine;
pub mod record;
