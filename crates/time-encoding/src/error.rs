// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for time encoding.

/// Errors that can occur while encoding forecast step times.
#[derive(Debug, thiserror::Error)]
pub enum TimeEncodingError {
    /// The step frequency must be at least one hour.
    #[error("step frequency must be positive, got {0} hours")]
    InvalidFrequency(u32),

    /// An offset timestamp falls outside the representable date range.
    #[error("timestamp out of range: {base} {offset_hours:+} hours")]
    OutOfRange { base: String, offset_hours: i64 },

    /// A timestamp string could not be parsed.
    #[error("invalid timestamp '{input}': expected YYYY-MM-DDTHH:MM[:SS]")]
    InvalidTimestamp { input: String },
}
