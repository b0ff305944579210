//! Benchmarks for the hot path the Selector and Outcome Recorder run on
//! every dispatch/outcome: the deterministic Quality Scorer and the
//! Predictive Scorer's feature extraction over a full (W=50) sample window.

use adaptive_proxy_scheduler::config::Tuning;
use adaptive_proxy_scheduler::scoring::predictive::{extract_features, predictive_adjustment};
use adaptive_proxy_scheduler::scoring::quality::metric_score;
use adaptive_proxy_scheduler::Sample;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn full_window() -> Vec<Sample> {
    (0..50)
        .map(|i| {
            let latency = 50.0 + (i as f64 % 7.0) * 20.0;
            let jitter = 5.0 + (i as f64 % 5.0) * 3.0;
            Sample::success(latency, jitter, 0.01, 2048, 1.5e7)
        })
        .collect()
}

fn bench_metric_score(c: &mut Criterion) {
    let sample = Sample::success(80.0, 10.0, 0.02, 4096, 2e7);
    let tuning = Tuning::default();
    c.bench_function("metric_score", |b| {
        b.iter(|| metric_score(black_box(&sample), black_box(&tuning)));
    });
}

fn bench_predictive_adjustment(c: &mut Criterion) {
    let window = full_window();
    let tuning = Tuning::default();
    c.bench_function("predictive_adjustment_full_window", |b| {
        b.iter(|| predictive_adjustment(black_box(&window), black_box(72.0), black_box(false), black_box(&tuning)));
    });
}

fn bench_feature_extraction(c: &mut Criterion) {
    let window = full_window();
    c.bench_function("extract_features_full_window", |b| {
        b.iter(|| extract_features(black_box(&window), black_box(72.0)));
    });
}

criterion_group!(benches, bench_metric_score, bench_predictive_adjustment, bench_feature_extraction);
criterion_main!(benches);
