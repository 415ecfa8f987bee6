// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for temporal embedding generation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use time_encoding::{parse_timestamp, TimeEncoder};

fn bench_encode(c: &mut Criterion) {
    let init = parse_timestamp("2024-01-01T00:00").unwrap();
    let encoder = TimeEncoder::default();

    let mut group = c.benchmark_group("encode");
    // 20 steps = 5 days, 60 = 15 days (short + medium + long).
    for steps in [20usize, 60, 240] {
        group.bench_with_input(BenchmarkId::from_parameter(steps), &steps, |b, &n| {
            b.iter(|| encoder.encode(black_box(init), n).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode);
criterion_main!(benches);
