// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # time-encoding
//!
//! Per-step temporal features for autoregressive forecast models.
//!
//! A forecast run advances in fixed hourly increments from an initial
//! timestamp. For every global step the model receives a
//! [`TemporalEmbedding`]: the sine and cosine of two cyclic phases
//! (day-of-year and hour-of-day) evaluated at the previous, current and next
//! step times.
//!
//! ```text
//! step i  ──►  t(i-1), t(i), t(i+1)
//!                 │
//!                 ▼  (doy / 366, hour / 24)      3 × 2 phases
//!                 ▼  [sin | cos]                 3 × 4
//!                 ▼  flatten                     12 features
//! ```
//!
//! # Example
//! ```
//! use time_encoding::{parse_timestamp, TimeEncoder};
//!
//! let init = parse_timestamp("2024-01-01T00:00").unwrap();
//! let embeddings = TimeEncoder::default().encode(init, 4).unwrap();
//! assert_eq!(embeddings.len(), 4);
//! assert_eq!(embeddings[0].as_slice().len(), 12);
//! ```

mod encoder;
mod error;
mod phase;

pub use encoder::{TemporalEmbedding, TimeEncoder, DEFAULT_FREQ_HOURS, EMBEDDING_DIM};
pub use error::TimeEncodingError;
pub use phase::{cyclic_phases, parse_timestamp, truncate_to_hour};
