//! Alignment throughput over synthetic action lists.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use tracekin_core::align::align;

/// Build a list that mixes identical, very-similar, and divergent entries.
fn synthetic_actions(count: usize, salt: usize) -> Vec<String> {
    (0..count)
        .map(|i| match (i + salt) % 4 {
            0 => format!("Navigate to https://bench.test/page{}?state=run{salt}", i / 4),
            1 => format!("Click element (#button{i})"),
            2 => "Fill element (#search)".to_string(),
            _ => format!("API Calls: fetchRows: {} started, {} succeeded", i % 3 + 1, i % 2),
        })
        .collect()
}

fn bench_align(c: &mut Criterion) {
    let small_a = synthetic_actions(16, 0);
    let small_b = synthetic_actions(16, 1);
    c.bench_function("align_16x16", |bencher| {
        bencher.iter(|| align(black_box(&small_a), black_box(&small_b)));
    });

    let large_a = synthetic_actions(128, 0);
    let large_b = synthetic_actions(128, 3);
    c.bench_function("align_128x128", |bencher| {
        bencher.iter(|| align(black_box(&large_a), black_box(&large_b)));
    });
}

criterion_group!(benches, bench_align);
criterion_main!(benches);
