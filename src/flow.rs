//! Directional flow table: groups packet records by (src, dst) endpoint pair
//! and keeps, per flow, the arrival time of every sequence number seen.

use crate::capture::record::PacketRecord;
use crate::protocol::{ParsedPacket, TransportHeader};
use crate::sequence::SequenceExtractor;
use ahash::AHashMap;
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    pub ip: IpAddr,
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ip {
            IpAddr::V4(ip) => write!(f, "{}:{}", ip, self.port),
            IpAddr::V6(ip) => write!(f, "[{}]:{}", ip, self.port),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowProtocol {
    Tcp,
    Udp,
}

impl FlowProtocol {
    /// Transport protocol of a decoded frame, `None` when it is neither TCP nor UDP.
    pub fn of(packet: &ParsedPacket<'_>) -> Option<Self> {
        match packet.transport {
            Some(TransportHeader::Tcp(_)) => Some(FlowProtocol::Tcp),
            Some(TransportHeader::Udp(_)) => Some(FlowProtocol::Udp),
            None => None,
        }
    }
}

impl fmt::Display for FlowProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowProtocol::Tcp => write!(f, "tcp"),
            FlowProtocol::Udp => write!(f, "udp"),
        }
    }
}

/// Identity of a unidirectional flow. `A -> B` and `B -> A` are different keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FlowKey {
    pub src: Endpoint,
    pub dst: Endpoint,
}

impl FlowKey {
    pub fn new(src: Endpoint, dst: Endpoint) -> Self {
        FlowKey { src, dst }
    }

    pub fn from_record(record: &PacketRecord) -> Self {
        FlowKey::new(record.src, record.dst)
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.src, self.dst)
    }
}

/// Per-flow sequence number -> arrival time (ms) map.
#[derive(Debug, Clone, Default)]
pub struct FlowRecord {
    arrivals: AHashMap<i64, f64>,
    has_payload: bool,
    packets: u64,
}

impl FlowRecord {
    /// Record an arrival. A repeated sequence number replaces the earlier time.
    pub fn observe(&mut self, seq: i64, arrival_ms: f64, carries_payload: bool) {
        self.arrivals.insert(seq, arrival_ms);
        self.has_payload |= carries_payload;
        self.packets += 1;
    }

    /// Number of distinct sequence numbers.
    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    pub fn arrival(&self, seq: i64) -> Option<f64> {
        self.arrivals.get(&seq).copied()
    }

    pub fn has_payload(&self) -> bool {
        self.has_payload
    }

    /// Packets that contributed to this flow, duplicates included.
    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// All (sequence, arrival) pairs ordered by ascending sequence number.
    pub fn sorted_arrivals(&self) -> Vec<(i64, f64)> {
        let mut entries: Vec<(i64, f64)> = self
            .arrivals
            .iter()
            .map(|(&seq, &arrival)| (seq, arrival))
            .collect();
        entries.sort_by_key(|&(seq, _)| seq);
        entries
    }
}

/// A flow that survived aggregation, numbered in first-seen order.
#[derive(Debug, Clone)]
pub struct Flow {
    pub index: usize,
    pub key: FlowKey,
    pub record: FlowRecord,
}

/// Single-pass aggregation of packet records into flows.
#[derive(Debug)]
pub struct FlowAggregator {
    extractor: SequenceExtractor,
    flows: Vec<(FlowKey, FlowRecord)>,
    index: AHashMap<FlowKey, usize>,
    skipped: u64,
}

impl FlowAggregator {
    pub fn new(extractor: SequenceExtractor) -> Self {
        FlowAggregator {
            extractor,
            flows: Vec::new(),
            index: AHashMap::new(),
            skipped: 0,
        }
    }

    pub fn observe(&mut self, record: &PacketRecord) {
        let Some(seq) = self.extractor.extract(record) else {
            self.skipped += 1;
            tracing::trace!(ts = record.ts, "packet skipped by sequence extractor");
            return;
        };

        let key = FlowKey::from_record(record);
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.flows.push((key, FlowRecord::default()));
                self.index.insert(key, self.flows.len() - 1);
                self.flows.len() - 1
            }
        };
        self.flows[slot]
            .1
            .observe(seq, record.ts * 1000.0, !record.payload.is_empty());
    }

    /// Packets the extractor rejected so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Apply the retention rule and number the surviving flows.
    ///
    /// TCP flows that never carried payload (handshakes, pure ACK streams)
    /// are dropped; UDP flows are all kept.
    pub fn finish(self) -> Vec<Flow> {
        let protocol = self.extractor.protocol();
        self.flows
            .into_iter()
            .filter(|(key, record)| {
                let keep = protocol != FlowProtocol::Tcp || record.has_payload();
                if !keep {
                    tracing::debug!(flow = %key, "dropping tcp flow without payload");
                }
                keep
            })
            .enumerate()
            .map(|(index, (key, record))| Flow { index, key, record })
            .collect()
    }
}

/// Aggregate a complete record sequence with the given extractor.
pub fn aggregate<'a, I>(records: I, extractor: SequenceExtractor) -> Vec<Flow>
where
    I: IntoIterator<Item = &'a PacketRecord>,
{
    let mut aggregator = FlowAggregator::new(extractor);
    for record in records {
        aggregator.observe(record);
    }
    aggregator.finish()
}
