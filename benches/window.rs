//! Scroll-path benchmarks: window computation and measurement updates at both index modes.

#![allow(clippy::semicolon_if_nothing_returned)]

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use virtual_window::{Virtualizer, VirtualizerOptions};

fn measured(count: usize) -> Virtualizer {
    let mut v = Virtualizer::new(VirtualizerOptions::new(count, 24).with_buffer(4))
        .expect("valid options");
    for i in (0..count).step_by(7) {
        v.record_measurement(i, 16 + (i % 48) as u32);
    }
    v
}

fn compute_window(c: &mut Criterion) {
    let small = measured(5_000);
    c.bench_function("compute_window_flat_5k", |b| {
        b.iter(|| small.compute_window(black_box(40_000), black_box(900)))
    });

    let large = measured(1_000_000);
    c.bench_function("compute_window_fenwick_1m", |b| {
        b.iter(|| large.compute_window(black_box(12_000_000), black_box(900)))
    });
}

fn record_measurement(c: &mut Criterion) {
    let mut large = measured(1_000_000);
    let mut i = 0usize;
    c.bench_function("record_measurement_fenwick_1m", |b| {
        b.iter(|| {
            i = (i + 7919) % 1_000_000;
            large.record_measurement(black_box(i), black_box(30 + (i % 20) as u32));
        })
    });
}

fn resize(c: &mut Criterion) {
    c.bench_function("set_items_length_cross_threshold", |b| {
        let mut v = measured(9_000);
        let mut grow = true;
        b.iter(|| {
            v.set_items_length(if grow { 11_000 } else { 9_000 });
            grow = !grow;
        })
    });
}

criterion_group!(benches, compute_window, record_measurement, resize);
criterion_main!(benches);
