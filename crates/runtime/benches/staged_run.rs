// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for a full staged run on the affine backend.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use forecast_ir::{AtmosphericState, Grid};
use runtime::{run_forecast, AffineModelProvider, AffineWeights, MemorySink, RuntimeConfig};
use tensor_core::{Shape, Tensor};
use time_encoding::parse_timestamp;

const CHANNELS: usize = 70;

fn state() -> AtmosphericState {
    let grid = Grid::regular(3.0, CHANNELS);
    let (_, h, w) = grid.dims();
    let times = vec![
        parse_timestamp("2023-12-31T18:00").unwrap(),
        parse_timestamp("2024-01-01T00:00").unwrap(),
    ];
    AtmosphericState::new(Tensor::zeros(Shape::new(vec![2, CHANNELS, h, w])), grid, times)
}

fn bench_staged_run(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    for stage in ["short", "medium", "long"] {
        AffineWeights::identity(CHANNELS)
            .save(&dir.path().join(format!("{stage}.safetensors")))
            .unwrap();
    }

    let mut group = c.benchmark_group("staged_run");
    for threads in [1usize, 4] {
        let config = RuntimeConfig {
            model_dir: dir.path().to_path_buf(),
            intra_op_threads: Some(threads),
            ..Default::default()
        };
        let provider = AffineModelProvider::from_config(&config);
        group.bench_with_input(BenchmarkId::new("3x4_steps", threads), &threads, |b, _| {
            b.iter(|| {
                let mut sink = MemorySink::new();
                run_forecast(config.clone(), &provider, state(), &[4, 4, 4], &mut sink).unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_staged_run);
criterion_main!(benches);
