//! Criterion benchmarks for the extraction and binning hot paths:
//! - `protocol::parse_frame` (zero-copy frame decoding)
//! - `flow::aggregate` (flow table and sequence map updates)
//! - `binning::bin` (shared-range histograms)

use cpdv::binning::{self, DistributionConfig, RangeSource};
use cpdv::capture::record::PacketRecord;
use cpdv::delta::{self, DeltaSeries};
use cpdv::flow;
use cpdv::protocol::{self, LinkLayer};
use cpdv::sequence::SequenceExtractor;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

/// Build a UDP/IPv4 frame whose payload starts with a big-endian sequence
/// number, the way iperf datagrams do.
fn make_udp_packet(src_ip: [u8; 4], dst_ip: [u8; 4], src_port: u16, seq: u32, payload_len: usize) -> Vec<u8> {
    let payload_len = payload_len.max(4);
    let mut pkt = vec![0u8; 14 + 20 + 8 + payload_len];

    // Ethernet header
    pkt[0..6].copy_from_slice(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff]);
    pkt[6..12].copy_from_slice(&[0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
    pkt[12] = 0x08;
    pkt[13] = 0x00;

    // IPv4 header
    let ip_total = (20 + 8 + payload_len) as u16;
    let ip = &mut pkt[14..34];
    ip[0] = 0x45;
    ip[2..4].copy_from_slice(&ip_total.to_be_bytes());
    ip[6] = 0x40; // DF
    ip[8] = 64;
    ip[9] = 17; // UDP
    ip[12..16].copy_from_slice(&src_ip);
    ip[16..20].copy_from_slice(&dst_ip);

    // UDP header
    let udp = &mut pkt[34..42];
    udp[0..2].copy_from_slice(&src_port.to_be_bytes());
    udp[2..4].copy_from_slice(&5001u16.to_be_bytes());
    udp[4..6].copy_from_slice(&((8 + payload_len) as u16).to_be_bytes());

    pkt[42..46].copy_from_slice(&seq.to_be_bytes());
    pkt
}

/// Records of `flows` interleaved UDP flows with `per_flow` packets each.
fn make_records(flows: u16, per_flow: u32) -> Vec<PacketRecord> {
    let mut records = Vec::with_capacity(flows as usize * per_flow as usize);
    for seq in 0..per_flow {
        for port in 0..flows {
            let pkt = make_udp_packet([10, 0, 0, 1], [10, 0, 0, 2], 40000 + port, seq, 1200);
            let parsed = protocol::parse_frame(LinkLayer::Ethernet, &pkt).unwrap();
            let ts = f64::from(seq) * 0.001 + f64::from(port) * 1e-6;
            records.push(PacketRecord::from_parsed(ts, &parsed).unwrap());
        }
    }
    records
}

fn bench_parse_frame(c: &mut Criterion) {
    let small = make_udp_packet([10, 0, 0, 1], [10, 0, 0, 2], 40000, 1, 4);
    let large = make_udp_packet([10, 0, 0, 1], [10, 0, 0, 2], 40000, 1, 1400);

    let mut group = c.benchmark_group("parse_frame");
    group.throughput(Throughput::Elements(1));

    group.bench_function("udp_46B", |b| {
        b.iter(|| {
            let _ = protocol::parse_frame(LinkLayer::Ethernet, black_box(&small));
        })
    });

    group.bench_function("udp_1442B", |b| {
        b.iter(|| {
            let _ = protocol::parse_frame(LinkLayer::Ethernet, black_box(&large));
        })
    });

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let records = make_records(8, 2_000);

    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Elements(records.len() as u64));

    group.bench_function("udp_8_flows", |b| {
        b.iter(|| flow::aggregate(black_box(&records), SequenceExtractor::UdpEmbedded))
    });

    group.finish();
}

fn bench_binning(c: &mut Criterion) {
    let flows = flow::aggregate(&make_records(4, 10_000), SequenceExtractor::UdpEmbedded);
    let series: Vec<DeltaSeries> = flows
        .iter()
        .filter_map(|f| delta::build(f.key.to_string(), &f.record))
        .collect();

    let mut group = c.benchmark_group("binning");
    group.throughput(Throughput::Elements(series.iter().map(|s| s.len() as u64).sum()));

    group.bench_function("percentile_95", |b| {
        let config = DistributionConfig {
            bin_size: 0.01,
            range: RangeSource::Percentile(95),
            clip: true,
        };
        b.iter(|| binning::bin(black_box(&series), &config))
    });

    group.bench_function("limits_noclip", |b| {
        let config = DistributionConfig {
            bin_size: 0.01,
            range: RangeSource::Limits { low: 0.0, high: 2.0 },
            clip: false,
        };
        b.iter(|| binning::bin(black_box(&series), &config))
    });

    group.finish();
}

criterion_group!(benches, bench_parse_frame, bench_aggregate, bench_binning);
criterion_main!(benches);
