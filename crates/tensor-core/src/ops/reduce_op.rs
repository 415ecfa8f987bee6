// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Whole-tensor reductions.

use crate::Tensor;

/// Returns `(min, max)` over all elements, or `None` for an
/// empty tensor. NaN values are skipped.
pub fn min_max(input: &Tensor) -> Option<(f32, f32)> {
    input
        .as_slice()
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Arithmetic mean accumulated in `f64`. Returns `0.0` for an empty tensor.
pub fn mean(input: &Tensor) -> f64 {
    let data = input.as_slice();
    if data.is_empty() {
        return 0.0;
    }
    data.iter().map(|&v| v as f64).sum::<f64>() / data.len() as f64
}
