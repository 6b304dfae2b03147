//! Benchmarks for packet decoding
//!
//! Measures:
//! - Decoding each of the three packet layouts from raw datagram bytes
//! - Rejecting datagrams of unknown length
//! - Pulling packets through a framed `PacketStream`

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use paddock::protocol::Packet;
use paddock::decode;
use paddock::race::LifecycleState;
use paddock::stream::PacketStream;
use paddock::test_utils::{additional_packet, capture_of, encode, participant_packet, telemetry_in};
use std::hint::black_box;

fn bench_decode_by_kind(c: &mut Criterion) {
    let names: Vec<String> = (0..16).map(|i| format!("Racer {i:02}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();

    let datagrams = [
        ("telemetry", encode(&telemetry_in(LifecycleState::Racing, 56).into())),
        ("participant", encode(&participant_packet(&names).into())),
        ("additional_participant", encode(&additional_packet(16, &names).into())),
    ];

    let mut group = c.benchmark_group("decode");
    for (name, bytes) in &datagrams {
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_function(*name, |b| b.iter(|| black_box(decode(black_box(bytes)))));
    }
    group.finish();
}

fn bench_unknown_length(c: &mut Criterion) {
    let bytes = vec![0u8; 1000];
    c.bench_function("decode_unknown_length", |b| {
        b.iter(|| black_box(decode(black_box(&bytes)).is_err()))
    });
}

fn bench_stream(c: &mut Criterion) {
    let packets: Vec<Packet> =
        (0..600).map(|_| telemetry_in(LifecycleState::Racing, 20).into()).collect();
    let capture = capture_of(&packets);

    let mut group = c.benchmark_group("packet_stream");
    group.throughput(Throughput::Bytes(capture.len() as u64));
    group.bench_function("framed_600_ticks", |b| {
        b.iter(|| {
            let stream = PacketStream::from_bytes(black_box(capture.clone()));
            black_box(stream.count())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_decode_by_kind, bench_unknown_length, bench_stream);
criterion_main!(benches);
