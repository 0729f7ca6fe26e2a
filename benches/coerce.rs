//! Argument coercion benchmarks
//!
//! Measures classifying host strings as integers, floats or bytes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mpy::coerce;

fn bench_coerce(c: &mut Criterion) {
    let mut group = c.benchmark_group("coerce");

    let inputs: [(&str, &[u8]); 6] = [
        ("int", b"1234567"),
        ("negative", b"-42"),
        ("bigint", b"123456789012345678901234567890"),
        ("float", b"3.14159e-2"),
        ("lookalike", b"1.2.3"),
        ("text", b"hello world"),
    ];

    for (label, input) in inputs.iter() {
        group.bench_with_input(BenchmarkId::new("single", label), input, |b, &input| {
            b.iter(|| coerce(black_box(input)));
        });
    }

    group.finish();
}

fn bench_coerce_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("coerce_batch");

    for size in [10, 100, 1000].iter() {
        let batch: Vec<Vec<u8>> = (0..*size)
            .map(|i| match i % 3 {
                0 => i.to_string().into_bytes(),
                1 => format!("{}.5", i).into_bytes(),
                _ => format!("key{}", i).into_bytes(),
            })
            .collect();
        group.bench_with_input(BenchmarkId::new("mixed", size), &batch, |b, batch| {
            b.iter(|| {
                for value in batch {
                    black_box(coerce(black_box(value)));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_coerce, bench_coerce_batch);
criterion_main!(benches);
