// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Stage names and stage descriptors.
//!
//! A stage is one phase of a forecast run bound to its own model. Each
//! model is trained for a lead-time range, so a long forecast hands the
//! running state from the short-range model to the medium-range one and
//! then to the long-range one.

use std::fmt;
use std::ops::Range;

/// Default stage names, in run order.
pub const CANONICAL_STAGES: [&str; 3] = ["short", "medium", "long"];

/// Name of a stage; also the key a model provider resolves a model by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StageName(String);

impl StageName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// `short`, `medium`, `long`.
    pub fn canonical() -> Vec<StageName> {
        CANONICAL_STAGES.iter().map(|&s| StageName::new(s)).collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// One entry of a [`crate::StagePlan`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Stage {
    /// Position of this stage in the run.
    pub index: usize,
    /// Model the stage runs against.
    pub name: StageName,
    /// Number of autoregressive steps in this stage.
    pub steps: usize,
    /// Global step index of the stage's first step.
    pub first_step: usize,
}

impl Stage {
    /// Global step indices covered by this stage.
    pub fn step_range(&self) -> Range<usize> {
        self.first_step..self.first_step + self.steps
    }

    pub fn contains_step(&self, global_step: usize) -> bool {
        self.step_range().contains(&global_step)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.step_range();
        write!(
            f,
            "stage {} '{}': {} steps (global {}..{})",
            self.index, self.name, self.steps, r.start, r.end
        )
    }
}
