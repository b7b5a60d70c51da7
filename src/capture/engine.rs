//! Offline capture reader: opens a pcap file and decodes every frame into
//! owned [`PacketRecord`]s.

use super::record::PacketRecord;
use crate::flow::FlowProtocol;
use crate::protocol::{self, LinkLayer};
use pcap::Capture;
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors from the capture reader.
#[derive(Debug)]
pub enum CaptureError {
    /// The capture uses a link type the frame decoder does not support.
    UnsupportedLink(i32),
    /// pcap error.
    Pcap(pcap::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::UnsupportedLink(linktype) => {
                write!(f, "unsupported link type {}", linktype)
            }
            CaptureError::Pcap(e) => write!(f, "pcap error: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Pcap(e) => Some(e),
            CaptureError::UnsupportedLink(_) => None,
        }
    }
}

impl From<pcap::Error> for CaptureError {
    fn from(e: pcap::Error) -> Self {
        CaptureError::Pcap(e)
    }
}

/// Contents of one capture file, fully decoded.
#[derive(Debug)]
pub struct CaptureFile {
    pub path: PathBuf,
    pub link: LinkLayer,
    /// Transport of the very first frame, `None` if it is neither TCP nor UDP.
    pub first_transport: Option<FlowProtocol>,
    /// TCP and UDP packets, in capture order.
    pub records: Vec<PacketRecord>,
    /// Number of frames read, including those that produced no record.
    pub frames: u64,
    /// Frames that failed to decode.
    pub parse_errors: u64,
}

/// Read a whole capture file into memory.
///
/// The pcap handle is dropped before returning, on success and on error.
pub fn read_capture(path: &Path) -> Result<CaptureFile, CaptureError> {
    let mut cap = Capture::from_file(path)?;
    let linktype = cap.get_datalink().0;
    let link = LinkLayer::from_linktype(linktype).ok_or(CaptureError::UnsupportedLink(linktype))?;

    let mut records = Vec::new();
    let mut first_transport = None;
    let mut frames: u64 = 0;
    let mut parse_errors: u64 = 0;

    loop {
        let packet = match cap.next_packet() {
            Ok(packet) => packet,
            Err(pcap::Error::NoMorePackets) => break,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "capture read error");
                return Err(CaptureError::Pcap(e));
            }
        };

        frames += 1;
        let timestamp =
            packet.header.ts.tv_sec as f64 + packet.header.ts.tv_usec as f64 / 1_000_000.0;

        match protocol::parse_frame(link, packet.data) {
            Ok(parsed) => {
                if frames == 1 {
                    first_transport = FlowProtocol::of(&parsed);
                }
                if let Some(record) = PacketRecord::from_parsed(timestamp, &parsed) {
                    records.push(record);
                }
            }
            Err(e) => {
                parse_errors += 1;
                tracing::debug!(error = %e, "parse error on frame #{}", frames);
            }
        }
    }

    tracing::info!(
        path = %path.display(),
        link = ?link,
        frames,
        records = records.len(),
        parse_errors,
        "capture read"
    );

    Ok(CaptureFile {
        path: path.to_path_buf(),
        link,
        first_transport,
        records,
        frames,
        parse_errors,
    })
}
