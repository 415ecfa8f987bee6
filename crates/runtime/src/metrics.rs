// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Forecast run metrics.
//!
//! [`RunMetrics`] collects per-stage model load and inference timings so
//! that runs on different backends and thread counts can be compared.

use std::time::Duration;

/// Metrics for a single stage.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StageMetrics {
    /// Stage name.
    pub stage: String,
    /// Steps completed in this stage.
    pub steps: usize,
    /// Time spent acquiring the stage's model.
    pub load_duration: Duration,
    /// Time spent in step calls and sink saves.
    pub inference_duration: Duration,
}

/// Aggregate metrics for a forecast run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunMetrics {
    /// Total wall-clock time for the run.
    pub total_duration: Duration,
    pub total_load_duration: Duration,
    pub total_inference_duration: Duration,
    /// Per-stage metrics, in run order.
    pub stage_metrics: Vec<StageMetrics>,
    /// Steps emitted to the sink.
    pub steps_completed: usize,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self {
            total_duration: Duration::ZERO,
            total_load_duration: Duration::ZERO,
            total_inference_duration: Duration::ZERO,
            stage_metrics: Vec::new(),
            steps_completed: 0,
        }
    }

    /// Records metrics for a finished stage.
    pub fn record_stage(
        &mut self,
        stage: String,
        steps: usize,
        load: Duration,
        inference: Duration,
    ) {
        self.total_load_duration += load;
        self.total_inference_duration += inference;
        self.steps_completed += steps;
        self.stage_metrics.push(StageMetrics {
            stage,
            steps,
            load_duration: load,
            inference_duration: inference,
        });
    }

    /// Finalises metrics with the total wall-clock time.
    pub fn finalise(&mut self, total: Duration) {
        self.total_duration = total;
    }

    /// Returns steps per second throughput.
    pub fn steps_per_second(&self) -> f64 {
        let secs = self.total_duration.as_secs_f64();
        if secs <= 0.0 || self.steps_completed == 0 {
            return 0.0;
        }
        self.steps_completed as f64 / secs
    }

    /// Returns a human-readable summary suitable for CLI output.
    pub fn summary(&self) -> String {
        let load_pct = if self.total_duration.as_secs_f64() > 0.0 {
            (self.total_load_duration.as_secs_f64() / self.total_duration.as_secs_f64()) * 100.0
        } else {
            0.0
        };

        format!(
            "Forecast: {:.2}ms total, {} steps in {} stages, \
             {:.2}ms model load ({:.0}%), {:.2}ms inference ({:.2} steps/s)",
            self.total_duration.as_secs_f64() * 1000.0,
            self.steps_completed,
            self.stage_metrics.len(),
            self.total_load_duration.as_secs_f64() * 1000.0,
            load_pct,
            self.total_inference_duration.as_secs_f64() * 1000.0,
            self.steps_per_second(),
        )
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// The result of a completed forecast run.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RunReport {
    /// Number of outputs handed to the sink; equals the planned total.
    pub steps_saved: usize,
    pub metrics: RunMetrics,
}
