//! Criterion benchmarks for the sweep runner hot loops.
//!
//! Run with: `cargo bench -p simlab-runner`
//!
//! Measures the performance-critical paths:
//! - Serial vs parallel sweep execution over a small grid
//! - Bootstrap correlation (the dominant aggregator cost)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use simlab_core::measure::funcs::SignalVariance;
use simlab_core::sim::generators::WhiteNoise;
use simlab_core::{ParamIter, ParamSlot, ParamValue, SimParams};
use simlab_runner::{bootstrap_corr, run_sweep, run_sweep_parallel, BootstrapConfig};

fn sweep_iter(n_values: usize) -> ParamIter {
    let base = SimParams::new(0.5, 200.0).unwrap();
    ParamIter::new(
        &base,
        ParamSlot::field("v"),
        (0..n_values).map(|v| ParamValue::from(v as f64)).collect(),
    )
    .unwrap()
}

fn bench_sweep_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("sweep_modes");
    let iter = sweep_iter(8);

    group.bench_function("serial", |b| {
        b.iter(|| {
            run_sweep(
                black_box(&WhiteNoise),
                black_box(&iter),
                &SignalVariance,
                10,
                42,
                "bench",
            )
            .unwrap()
        });
    });

    group.bench_function("parallel", |b| {
        b.iter(|| {
            run_sweep_parallel(
                black_box(&WhiteNoise),
                black_box(&iter),
                &SignalVariance,
                10,
                -1,
                42,
                "bench",
            )
            .unwrap()
        });
    });

    group.finish();
}

fn bench_bootstrap_corr(c: &mut Criterion) {
    let mut group = c.benchmark_group("bootstrap_corr");

    for size in [50, 200, 1000] {
        let x: Vec<f64> = (0..size).map(|i| (i as f64 * 0.13).sin()).collect();
        let y: Vec<f64> = (0..size).map(|i| (i as f64 * 0.13).sin() + (i as f64 * 0.7).cos()).collect();
        let config = BootstrapConfig::default();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| bootstrap_corr(black_box(&x), black_box(&y), &config).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_sweep_modes, bench_bootstrap_corr);
criterion_main!(benches);
