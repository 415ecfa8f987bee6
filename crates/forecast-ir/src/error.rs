// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for forecast states and stage plans.

/// Errors that can occur when building or reading forecast inputs.
#[derive(Debug, thiserror::Error)]
pub enum IrError {
    /// The state tensor disagrees with its coordinates or timestamps.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The latitude axis is not ordered from +90 down to -90.
    #[error("latitude axis must run from +90 to -90 (north to south), found {first} .. {last}: {detail}")]
    LatitudeOrder { first: f32, last: f32, detail: String },

    /// The stage plan is empty, has a zero-step stage, or names more
    /// stages than are available.
    #[error("invalid stage plan: {0}")]
    InvalidPlan(String),

    /// The state file could not be read or written.
    #[error("state file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The SafeTensors payload is malformed or missing an entry.
    #[error("SafeTensors error: {0}")]
    SafeTensors(String),

    /// A tensor could not be built from the stored buffer.
    #[error("tensor error: {0}")]
    Tensor(#[from] tensor_core::TensorError),

    /// A stored timestamp could not be parsed.
    #[error("timestamp error: {0}")]
    Time(#[from] time_encoding::TimeEncodingError),
}
