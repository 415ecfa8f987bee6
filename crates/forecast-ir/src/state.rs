// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Atmospheric state: the field a forecast run starts from.
//!
//! # Type-State Pattern
//!
//! ```text
//! AtmosphericState<Loaded>    : read from a source, not yet checked.
//!       │  .validate()
//!       ▼
//! AtmosphericState<Validated> : shapes agree, latitudes run +90 → -90,
//!                               timestamps increase; ready for the driver.
//! ```
//!
//! Only a validated state exposes its initial time and the batched model
//! window, so the driver cannot start from a south-to-north grid.

use crate::{Grid, IrError};
use chrono::{NaiveDateTime, TimeDelta};
use std::fmt;
use std::sync::Arc;
use tensor_core::{min_max, Tensor};

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: state has been loaded but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: state has passed all invariant checks.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for state markers.
pub trait StateCheck: fmt::Debug + Clone {}
impl StateCheck for Loaded {}
impl StateCheck for Validated {}

// ── AtmosphericState ───────────────────────────────────────────────

/// A gridded field of shape `[time, variable, lat, lon]` with one timestamp
/// per time slice.
#[derive(Debug, Clone)]
pub struct AtmosphericState<S: StateCheck = Loaded> {
    data: Tensor,
    grid: Grid,
    times: Vec<NaiveDateTime>,
    source: Option<String>,
    _state: std::marker::PhantomData<S>,
}

impl AtmosphericState<Loaded> {
    /// Creates a state in the `Loaded` state.
    pub fn new(data: Tensor, grid: Grid, times: Vec<NaiveDateTime>) -> Self {
        Self {
            data,
            grid,
            times,
            source: None,
            _state: std::marker::PhantomData,
        }
    }

    /// Attaches a label (usually the input file name) carried into
    /// output provenance.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Validates the state and transitions to `Validated`.
    ///
    /// # Checks
    /// - The tensor has rank 4 and at least one time slice.
    /// - Tensor dims agree with timestamps, variables, latitudes and
    ///   longitudes.
    /// - Latitudes run from +90 to -90, strictly decreasing.
    /// - Timestamps strictly increase.
    pub fn validate(self) -> Result<AtmosphericState<Validated>, IrError> {
        let dims = self.data.dims();
        if dims.len() != 4 {
            return Err(IrError::InvalidState(format!(
                "expected [time, variable, lat, lon], got shape {}",
                self.data.shape()
            )));
        }

        let (n_var, n_lat, n_lon) = self.grid.dims();
        let expected = [self.times.len(), n_var, n_lat, n_lon];
        let axes = ["time", "variable", "lat", "lon"];
        for ((axis, &got), want) in axes.iter().zip(dims).zip(expected) {
            if got != want {
                return Err(IrError::InvalidState(format!(
                    "{axis} axis has length {got} but {want} coordinates were given"
                )));
            }
        }
        if self.times.is_empty() {
            return Err(IrError::InvalidState("state has no time slices".into()));
        }

        self.grid.check_latitude_order()?;

        if let Some(w) = self.times.windows(2).find(|w| w[1] <= w[0]) {
            return Err(IrError::InvalidState(format!(
                "timestamps must increase, found {} followed by {}",
                w[0], w[1]
            )));
        }

        Ok(AtmosphericState {
            data: self.data,
            grid: self.grid,
            times: self.times,
            source: self.source,
            _state: std::marker::PhantomData,
        })
    }
}

impl AtmosphericState<Validated> {
    /// The forecast anchor: the last time value of the state.
    pub fn init_time(&self) -> NaiveDateTime {
        *self
            .times
            .last()
            .expect("validated state has at least one time slice")
    }

    /// Provenance for outputs produced from this state.
    pub fn provenance(&self, freq_hours: u32) -> Provenance {
        Provenance {
            init_time: self.init_time(),
            freq_hours,
            grid: Arc::new(self.grid.clone()),
            source: self.source.clone(),
        }
    }

    /// Consumes the state and returns the `[1, time, variable, lat, lon]`
    /// model window.
    pub fn into_window(self) -> Result<Tensor, IrError> {
        Ok(tensor_core::unsqueeze(self.data, 0)?)
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: StateCheck> AtmosphericState<S> {
    pub fn data(&self) -> &Tensor {
        &self.data
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Returns a one-line summary: shape, value range and time span.
    pub fn summary(&self) -> String {
        let range = match min_max(&self.data) {
            Some((lo, hi)) => format!("{lo:.2} ~ {hi:.2}"),
            None => "empty".to_string(),
        };
        let span = match (self.times.first(), self.times.last()) {
            (Some(a), Some(b)) => format!("{a} .. {b}"),
            _ => "no times".to_string(),
        };
        format!(
            "State {}: {}, values {}, times {}",
            self.data.shape(),
            self.grid,
            range,
            span,
        )
    }
}

// ── Provenance ─────────────────────────────────────────────────────

/// Where a step's output came from and when it is valid.
///
/// Cheap to clone; the grid is shared.
#[derive(Debug, Clone, PartialEq)]
pub struct Provenance {
    init_time: NaiveDateTime,
    freq_hours: u32,
    grid: Arc<Grid>,
    source: Option<String>,
}

impl Provenance {
    pub fn new(
        init_time: NaiveDateTime,
        freq_hours: u32,
        grid: Grid,
        source: Option<String>,
    ) -> Self {
        Self {
            init_time,
            freq_hours,
            grid: Arc::new(grid),
            source,
        }
    }

    pub fn init_time(&self) -> NaiveDateTime {
        self.init_time
    }

    pub fn freq_hours(&self) -> u32 {
        self.freq_hours
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Hours from the initial time to the output of `global_step`.
    /// Step 0 is one frequency ahead of the initial time.
    pub fn lead_hours(&self, global_step: usize) -> u64 {
        (global_step as u64 + 1) * u64::from(self.freq_hours)
    }

    /// Valid time of the output of `global_step`.
    pub fn valid_time(&self, global_step: usize) -> Option<NaiveDateTime> {
        let hours = i64::try_from(self.lead_hours(global_step)).ok()?;
        self.init_time
            .checked_add_signed(TimeDelta::try_hours(hours)?)
    }
}
