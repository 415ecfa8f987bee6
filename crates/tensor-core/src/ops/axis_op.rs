// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Axis selection, slicing and concatenation.

use crate::{Shape, Tensor, TensorError};

/// Picks index `index` along `axis`, removing that axis.
///
/// `select(window, 1, t - 1)` on a `[batch, time, var, lat, lon]` window
/// yields the latest `[batch, var, lat, lon]` slice.
///
/// # Errors
/// [`TensorError::AxisOutOfRange`] or [`TensorError::IndexOutOfRange`].
pub fn select(input: &Tensor, axis: usize, index: usize) -> Result<Tensor, TensorError> {
    let (outer, len, inner) = split(input.shape(), axis, "select")?;
    if index >= len {
        return Err(TensorError::IndexOutOfRange {
            op: "select",
            axis,
            index,
            len,
        });
    }

    let src = input.as_slice();
    let mut data = Vec::with_capacity(outer * inner);
    for o in 0..outer {
        let start = (o * len + index) * inner;
        data.extend_from_slice(&src[start..start + inner]);
    }

    let shape = input
        .shape()
        .without_axis(axis)
        .expect("axis checked by split");
    Tensor::from_vec(shape, data)
}

/// Returns the sub-range `start..start + length` along `axis`.
pub fn narrow(
    input: &Tensor,
    axis: usize,
    start: usize,
    length: usize,
) -> Result<Tensor, TensorError> {
    let (outer, len, inner) = split(input.shape(), axis, "narrow")?;
    let end = start.checked_add(length).unwrap_or(usize::MAX);
    if end > len {
        return Err(TensorError::IndexOutOfRange {
            op: "narrow",
            axis,
            index: end,
            len,
        });
    }

    let src = input.as_slice();
    let mut data = Vec::with_capacity(outer * length * inner);
    for o in 0..outer {
        let begin = (o * len + start) * inner;
        data.extend_from_slice(&src[begin..begin + length * inner]);
    }

    let shape = input
        .shape()
        .with_dim(axis, length)
        .expect("axis checked by split");
    Tensor::from_vec(shape, data)
}

/// Concatenates tensors along `axis`. All other dimensions must match.
pub fn concat(tensors: &[&Tensor], axis: usize) -> Result<Tensor, TensorError> {
    let first = tensors.first().ok_or(TensorError::Empty { op: "concat" })?;
    let (outer, _, inner) = split(first.shape(), axis, "concat")?;

    let mut total_len = 0;
    for t in tensors {
        let compatible = t.rank() == first.rank()
            && t
                .dims()
                .iter()
                .zip(first.dims())
                .enumerate()
                .all(|(i, (a, b))| i == axis || a == b);
        if !compatible {
            return Err(TensorError::ShapeMismatch {
                op: "concat",
                lhs: first.shape().clone(),
                rhs: t.shape().clone(),
            });
        }
        total_len += t.dims()[axis];
    }

    let mut data = Vec::with_capacity(outer * total_len * inner);
    for o in 0..outer {
        for t in tensors {
            let chunk = t.dims()[axis] * inner;
            data.extend_from_slice(&t.as_slice()[o * chunk..(o + 1) * chunk]);
        }
    }

    let shape = first
        .shape()
        .with_dim(axis, total_len)
        .expect("axis checked by split");
    Tensor::from_vec(shape, data)
}

/// Inserts a length-1 axis at `axis`. The buffer is reused.
pub fn unsqueeze(input: Tensor, axis: usize) -> Result<Tensor, TensorError> {
    let shape = input
        .shape()
        .with_unit_axis(axis)
        .ok_or(TensorError::AxisOutOfRange {
            op: "unsqueeze",
            axis,
            rank: input.rank(),
        })?;
    input.reshape(shape)
}

fn split(shape: &Shape, axis: usize, op: &'static str) -> Result<(usize, usize, usize), TensorError> {
    shape.split_at_axis(axis).ok_or(TensorError::AxisOutOfRange {
        op,
        axis,
        rank: shape.rank(),
    })
}
