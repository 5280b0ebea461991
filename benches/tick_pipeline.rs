//! Benchmarks for the per-packet hot path
//!
//! Measures decode and mapping cost for synthetic Forza packets:
//! - Decoding each dash layout
//! - Mapping an idle packet (one batch)
//! - Mapping a racing packet with grip loss (three batches)
//! - Serializing a batch to DSX JSON
//!
//! Platform: Cross-platform (no sockets)

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use forza_dsx::config::Config;
use forza_dsx::events::NullSink;
use forza_dsx::mapping::HapticEngine;
use forza_dsx::packet::{self, PacketVariant};
use forza_dsx::test_utils::PacketBuilder;
use std::hint::black_box;

fn racing_packet(variant: PacketVariant) -> Vec<u8> {
    PacketBuilder::new(variant)
        .race_on(true)
        .engine(8000.0, 900.0, 6200.0)
        .acceleration(6.0, 0.0, 4.0)
        .combined_slip(1.2, 1.1, 1.6, 1.5)
        .car(4, 820)
        .power(210_000.0)
        .inputs(240, 130)
        .build()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for variant in [
        PacketVariant::LegacyDash,
        PacketVariant::HorizonDash,
        PacketVariant::ExtendedDash,
    ] {
        let buf = racing_packet(variant);
        group.throughput(Throughput::Bytes(buf.len() as u64));
        group.bench_function(format!("{variant:?}"), |b| {
            b.iter(|| black_box(packet::decode(black_box(&buf)).unwrap()))
        });
    }
    group.finish();
}

fn bench_map(c: &mut Criterion) {
    let config = Config::default();
    let mut group = c.benchmark_group("map");

    let idle = packet::decode(&PacketBuilder::new(PacketVariant::HorizonDash).car(2, 200).build())
        .unwrap()
        .unwrap();
    let mut engine = HapticEngine::new(&config);
    group.bench_function("idle", |b| {
        b.iter(|| black_box(engine.map(black_box(&idle), &config, &NullSink)))
    });

    let racing = packet::decode(&racing_packet(PacketVariant::HorizonDash)).unwrap().unwrap();
    let mut engine = HapticEngine::new(&config);
    group.bench_function("racing_grip_loss", |b| {
        b.iter(|| black_box(engine.map(black_box(&racing), &config, &NullSink)))
    });

    group.finish();
}

fn bench_full_tick(c: &mut Criterion) {
    let config = Config::default();
    let buf = racing_packet(PacketVariant::ExtendedDash);
    let mut engine = HapticEngine::new(&config);

    c.bench_function("decode_map_serialize", |b| {
        b.iter(|| {
            let snapshot = packet::decode(black_box(&buf)).unwrap().unwrap();
            let mut bytes = 0;
            for batch in engine.tick(&snapshot, &config, &NullSink) {
                bytes += batch.to_json().unwrap().len();
            }
            black_box(bytes)
        })
    });
}

criterion_group!(benches, bench_decode, bench_map, bench_full_tick);
criterion_main!(benches);
