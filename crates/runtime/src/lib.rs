// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! The driver that runs a staged autoregressive weather forecast.
//!
//! The runtime takes:
//! - An initial `AtmosphericState` from `forecast-ir`.
//! - Per-stage step counts, matched by position to the configured stage
//!   names (`short`, `medium`, `long` by default).
//! - A [`ModelProvider`] that resolves a stage name to a [`ForecastModel`].
//! - An [`OutputSink`] that receives every step's output.
//!
//! And runs the stages in order, rolling the state window forward one step
//! at a time with a temporal embedding per global step from
//! `time-encoding`.
//!
//! # Type-State Pipeline
//! ```text
//! ForecastDriver<Idle> → ForecastDriver<Planned> → RunReport
//! ```
//! Transitions are compile-time checked.
//!
//! # Backends and Sinks
//! [`AffineModelProvider`] is a CPU reference backend whose per-stage
//! weights are memory-mapped SafeTensors files. [`SafeTensorsSink`] writes
//! one file per step; [`MemorySink`] keeps outputs in memory.

mod affine;
mod config;
mod driver;
mod error;
mod metrics;
mod model;
mod sink;

pub use affine::{AffineModel, AffineModelProvider, AffineWeights};
pub use config::{Device, RuntimeConfig};
pub use driver::{run_forecast, DriverState, ForecastDriver, Idle, Planned};
pub use error::{BoxError, RuntimeError};
pub use metrics::{RunMetrics, RunReport, StageMetrics};
pub use model::{ForecastModel, ModelProvider, OutputSink};
pub use sink::{MemorySink, SafeTensorsSink, SavedOutput};
