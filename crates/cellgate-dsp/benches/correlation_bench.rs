//! Benchmarks for the fingerprint codec and correlation scorer
//!
//! Run with: cargo bench --package cellgate-dsp

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use num_complex::Complex64;

use cellgate_core::ANTENNA_COUNT;
use cellgate_dsp::{score, ChannelVector, FingerprintHandle};

/// Deterministic synthetic CSI with realistic multipath structure
fn synthetic_vector(seed: usize) -> ChannelVector {
    let coeffs: Vec<Complex64> = (0..ANTENNA_COUNT)
        .map(|i| {
            let t = (i + seed * 7) as f64;
            Complex64::new(
                0.6 * (t * 0.13).sin() + 0.2 * (t * 0.71).cos(),
                0.6 * (t * 0.29).cos() - 0.2 * (t * 0.53).sin(),
            )
        })
        .collect();
    ChannelVector::from_complex(&coeffs).unwrap()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("Fingerprint Encode");
    let v = synthetic_vector(1);

    group.throughput(Throughput::Elements(ANTENNA_COUNT as u64));
    group.bench_function("encode", |b| {
        b.iter(|| FingerprintHandle::from_vector(black_box(&v)));
    });

    group.finish();
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("Correlation Score");
    let live = synthetic_vector(1);
    let matching = FingerprintHandle::from_vector(&live);
    let foreign = FingerprintHandle::from_vector(&synthetic_vector(2));

    group.throughput(Throughput::Elements(ANTENNA_COUNT as u64));
    group.bench_function("score_matching", |b| {
        b.iter(|| score(black_box(&live), black_box(&matching)));
    });
    group.bench_function("score_foreign", |b| {
        b.iter(|| score(black_box(&live), black_box(&foreign)));
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_score);
criterion_main!(benches);
