// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Collaborator traits: where models come from and where outputs go.
//!
//! The driver only sees these traits. A backend implements
//! [`ModelProvider`] and [`ForecastModel`]; a consumer of forecast fields
//! implements [`OutputSink`].

use crate::BoxError;
use forecast_ir::{Provenance, StageName};
use tensor_core::Tensor;
use time_encoding::TemporalEmbedding;

/// Resolves a stage name to a ready-to-run model.
pub trait ModelProvider {
    /// Acquires the model for `stage`.
    ///
    /// The returned handle is owned by the driver for the duration of one
    /// stage and dropped before the next stage's model is acquired.
    fn load(&self, stage: &StageName) -> Result<Box<dyn ForecastModel>, BoxError>;
}

/// One stage's inference capability.
///
/// Resources held by the model are released when it is dropped.
pub trait ForecastModel {
    /// Advances the window by one step.
    ///
    /// `window` has shape `[1, time, variable, lat, lon]`. The result must
    /// have the same batch, variable, lat and lon dims and a time axis of
    /// length at least one; only its last time slice is read as the step's
    /// output, and the whole result becomes the next step's window.
    fn step(&mut self, window: &Tensor, embedding: &TemporalEmbedding) -> Result<Tensor, BoxError>;
}

/// Receives every step's output in increasing step order.
pub trait OutputSink {
    /// Persists `output` (shape `[1, variable, lat, lon]`) for `global_step`.
    fn save(
        &mut self,
        output: &Tensor,
        provenance: &Provenance,
        global_step: usize,
    ) -> Result<(), BoxError>;
}

impl<P: ModelProvider + ?Sized> ModelProvider for &P {
    fn load(&self, stage: &StageName) -> Result<Box<dyn ForecastModel>, BoxError> {
        (**self).load(stage)
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn save(
        &mut self,
        output: &Tensor,
        provenance: &Provenance,
        global_step: usize,
    ) -> Result<(), BoxError> {
        (**self).save(output, provenance, global_step)
    }
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn save(
        &mut self,
        output: &Tensor,
        provenance: &Provenance,
        global_step: usize,
    ) -> Result<(), BoxError> {
        (**self).save(output, provenance, global_step)
    }
}
