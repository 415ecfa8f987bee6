// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the forecast driver.

/// Error type returned by collaborators (model providers, models, sinks).
///
/// The driver wraps it into the matching [`RuntimeError`] kind.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during a forecast run.
///
/// None of these are retried by the driver.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The initial state or the stage plan is malformed. Raised before
    /// any model is loaded.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// A stage's model could not be acquired.
    #[error("failed to load model for stage '{stage}': {source}")]
    ModelLoad {
        stage: String,
        #[source]
        source: BoxError,
    },

    /// A step invocation failed or returned a malformed window.
    #[error("inference failed in stage '{stage}' at step {step}: {source}")]
    Inference {
        stage: String,
        step: usize,
        #[source]
        source: BoxError,
    },

    /// The output sink could not persist a step.
    #[error("failed to write output for step {step}: {source}")]
    OutputWrite {
        step: usize,
        #[source]
        source: BoxError,
    },

    /// The step counter ran past the precomputed embedding sequence.
    /// Indicates a bug in stage-plan construction.
    #[error("step counter {step} exceeded planned total of {total} steps")]
    ConsistencyViolation { step: usize, total: usize },

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl From<forecast_ir::IrError> for RuntimeError {
    fn from(e: forecast_ir::IrError) -> Self {
        Self::PreconditionViolation(e.to_string())
    }
}

impl From<time_encoding::TimeEncodingError> for RuntimeError {
    fn from(e: time_encoding::TimeEncodingError) -> Self {
        Self::PreconditionViolation(e.to_string())
    }
}
