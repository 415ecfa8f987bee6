// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.

use crate::Shape;

/// Errors that can occur during tensor operations.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The number of values does not match the element count of the shape.
    #[error("buffer size mismatch: shape {shape} needs {expected} elements, got {actual}")]
    BufferSizeMismatch {
        shape: Shape,
        expected: usize,
        actual: usize,
    },

    /// Two tensors have incompatible shapes for the requested operation.
    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: &'static str,
        lhs: Shape,
        rhs: Shape,
    },

    /// An axis argument is out of range for the tensor's rank.
    #[error("axis {axis} out of range for rank {rank} in {op}")]
    AxisOutOfRange {
        op: &'static str,
        axis: usize,
        rank: usize,
    },

    /// An index or range exceeds the length of the addressed axis.
    #[error("index {index} out of range for axis {axis} of length {len} in {op}")]
    IndexOutOfRange {
        op: &'static str,
        axis: usize,
        index: usize,
        len: usize,
    },

    /// The operation received no input tensors.
    #[error("{op} requires at least one tensor")]
    Empty { op: &'static str },
}
