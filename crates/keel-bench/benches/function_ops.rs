//! Criterion micro-benchmarks for Function construction, cloning and calls.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use keel_function::Function;
use keel_test_utils::fixtures::{add, offset_adder, weighted_sum};

/// Benchmark: 1K calls through a plain function pointer.
fn bench_call_plain(c: &mut Criterion) {
    let mut f = Function::<(i32, i32), i32>::from_fn(add);
    c.bench_function("call_plain_1k", |b| {
        b.iter(|| {
            let mut acc = 0i32;
            for i in 0..1_000 {
                acc = acc.wrapping_add(f.call((black_box(i), 1)));
            }
            black_box(acc);
        });
    });
}

/// Benchmark: 1K calls through inline and heap dispatch.
fn bench_call_value(c: &mut Criterion) {
    let mut inline = Function::<(i32, i32), i32>::from_value(offset_adder(3));
    c.bench_function("call_inline_1k", |b| {
        b.iter(|| {
            let mut acc = 0i32;
            for i in 0..1_000 {
                acc = acc.wrapping_add(inline.call((black_box(i), 1)));
            }
            black_box(acc);
        });
    });

    let mut heap = Function::<(u64,), u64>::from_value(weighted_sum([1, 2, 3, 4, 5, 6, 7, 8]));
    c.bench_function("call_heap_1k", |b| {
        b.iter(|| {
            let mut acc = 0u64;
            for i in 0..1_000u64 {
                acc = acc.wrapping_add(heap.call((black_box(i),)));
            }
            black_box(acc);
        });
    });
}

/// Benchmark: clone of an inline and a heap-stored value.
fn bench_clone(c: &mut Criterion) {
    let inline = Function::<(i32, i32), i32>::from_value(offset_adder(3));
    let heap = Function::<(u64,), u64>::from_value(weighted_sum([1; 8]));
    c.bench_function("clone_inline", |b| b.iter(|| black_box(inline.clone())));
    c.bench_function("clone_heap", |b| b.iter(|| black_box(heap.clone())));
}

criterion_group!(benches, bench_call_plain, bench_call_value, bench_clone);
criterion_main!(benches);
