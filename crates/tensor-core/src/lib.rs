// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Strongly typed `f32` tensors for gridded forecast fields.
//!
//! This crate provides:
//! - [`Tensor`]: an owned, row-major, n-dimensional `f32` buffer that always
//!   carries its [`Shape`].
//! - [`Shape`]: dimension descriptor with stride and axis helpers.
//! - Axis operations used to move a forecast window forward in time:
//!   [`select`], [`narrow`], [`concat`] and [`unsqueeze`].
//! - Reductions used for logging and sanity checks: [`min_max`] and [`mean`].
//!
//! # Axis Conventions
//! The crate itself is axis-agnostic. Callers in this workspace use
//! `[batch, time, variable, lat, lon]` for model windows and
//! `[batch, variable, lat, lon]` for a single forecast slice.

mod error;
mod ops;
mod shape;
mod tensor;

pub use error::TensorError;
pub use ops::{concat, mean, min_max, narrow, select, unsqueeze};
pub use shape::Shape;
pub use tensor::Tensor;
