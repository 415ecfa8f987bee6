// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor operations.
//!
//! Axis operations return new tensors; inputs are never modified. This
//! matches how forecast state flows between steps: each step's window is a
//! fresh value and the previous one is dropped.

mod axis_op;
mod reduce_op;

pub use axis_op::{concat, narrow, select, unsqueeze};
pub use reduce_op::{mean, min_max};
