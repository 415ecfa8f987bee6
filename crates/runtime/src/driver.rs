// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The staged forecast driver with a type-state–enforced pipeline.
//!
//! ```text
//! ForecastDriver<Idle>
//!     │  .plan(step_counts)
//!     ▼
//! ForecastDriver<Planned>
//!     │  .run(provider, state, sink)      (repeatable)
//!     ▼
//!   RunReport
//! ```
//!
//! A run walks the stages in order. Each stage acquires its model from the
//! [`ModelProvider`], runs its steps, and drops the model before the next
//! stage acquires its own. After every step the newest time slice of the
//! window goes to the [`OutputSink`].

use crate::{
    BoxError, ModelProvider, OutputSink, RunMetrics, RunReport, RuntimeConfig, RuntimeError,
};
use forecast_ir::{state::Loaded, AtmosphericState, StagePlan};
use std::time::Instant;
use tensor_core::{min_max, select, Tensor};
use time_encoding::{TimeEncoder, EMBEDDING_DIM};

// ── Type-state markers ─────────────────────────────────────────────

/// Driver is configured but has no stage plan.
#[derive(Debug)]
pub struct Idle;

/// A validated stage plan is attached; the driver can run.
#[derive(Debug)]
pub struct Planned;

/// Sealed trait for driver states.
pub trait DriverState: std::fmt::Debug {}
impl DriverState for Idle {}
impl DriverState for Planned {}

// ── Driver ─────────────────────────────────────────────────────────

/// Runs a staged autoregressive forecast.
///
/// # Example
/// ```no_run
/// use forecast_ir::StateLoader;
/// use runtime::{AffineModelProvider, ForecastDriver, RuntimeConfig, SafeTensorsSink};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = RuntimeConfig::from_file(Path::new("forecast.toml"))?;
/// let provider = AffineModelProvider::from_config(&config);
/// let driver = ForecastDriver::new(config).plan(&[20, 20, 20])?;
///
/// let state = StateLoader::load(Path::new("input/2024-01-01-00-00.safetensors"))?;
/// let mut sink = SafeTensorsSink::new("output")?;
/// let report = driver.run(&provider, state, &mut sink)?;
/// println!("{}", report.metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct ForecastDriver<S: DriverState = Idle> {
    config: RuntimeConfig,
    plan: Option<StagePlan>,
    _state: std::marker::PhantomData<S>,
}

// ── Idle → Planned ─────────────────────────────────────────────────

impl ForecastDriver<Idle> {
    pub fn new(config: RuntimeConfig) -> Self {
        tracing::debug!(
            "driver created for {} on {}",
            config.model_dir.display(),
            config.device,
        );
        Self {
            config,
            plan: None,
            _state: std::marker::PhantomData,
        }
    }

    /// Builds the stage plan from the configured stage names and
    /// `step_counts`, matched by position.
    ///
    /// # Errors
    /// - [`RuntimeError::ConfigError`] if the configuration is invalid.
    /// - [`RuntimeError::PreconditionViolation`] if `step_counts` is empty,
    ///   contains a zero, or has more entries than there are stages.
    pub fn plan(self, step_counts: &[usize]) -> Result<ForecastDriver<Planned>, RuntimeError> {
        self.config.validate()?;
        let plan = StagePlan::new(self.config.stage_names(), step_counts)?;
        tracing::info!("{}", plan.summary());

        Ok(ForecastDriver {
            config: self.config,
            plan: Some(plan),
            _state: std::marker::PhantomData,
        })
    }
}

// ── Planned: run ───────────────────────────────────────────────────

impl ForecastDriver<Planned> {
    pub fn stage_plan(&self) -> &StagePlan {
        self.plan.as_ref().expect("plan exists in Planned state")
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Runs every planned step from `state`, saving each output to `sink`.
    ///
    /// The driver holds no state between runs, so identical inputs give
    /// identical outputs.
    ///
    /// # Errors
    /// - [`RuntimeError::PreconditionViolation`] if the state is malformed
    ///   (including south-to-north latitudes). No model is loaded.
    /// - [`RuntimeError::ModelLoad`], [`RuntimeError::Inference`] and
    ///   [`RuntimeError::OutputWrite`] from the collaborators. Outputs
    ///   saved before the failure stay valid.
    /// - [`RuntimeError::ConsistencyViolation`] if the step counter runs
    ///   past the planned total.
    pub fn run<P, O>(
        &self,
        provider: &P,
        state: AtmosphericState<Loaded>,
        sink: &mut O,
    ) -> Result<RunReport, RuntimeError>
    where
        P: ModelProvider + ?Sized,
        O: OutputSink + ?Sized,
    {
        let run_start = Instant::now();
        let plan = self.stage_plan();
        let total = plan.total_steps();

        let state = state.validate()?;
        let init_time = state.init_time();
        tracing::info!("initial time: {init_time}");
        if let Some((first, last)) = state.grid().latitude_range() {
            tracing::info!("latitude: {first} ~ {last}");
        }
        tracing::info!("{}", state.summary());

        let embeddings = TimeEncoder::new(self.config.freq_hours)?.encode(init_time, total)?;
        let emb_mean = if embeddings.is_empty() {
            0.0
        } else {
            embeddings
                .iter()
                .flat_map(|e| e.as_slice())
                .map(|&v| f64::from(v))
                .sum::<f64>()
                / (embeddings.len() * EMBEDDING_DIM) as f64
        };
        tracing::info!(
            "temporal embeddings: [{}, {}], mean {:.4}",
            embeddings.len(),
            EMBEDDING_DIM,
            emb_mean,
        );

        let provenance = state.provenance(self.config.freq_hours);
        let mut window = state.into_window()?;
        let mut global_step = 0usize;
        let mut metrics = RunMetrics::new();

        for stage in plan.iter() {
            let stage_name = stage.name.to_string();

            let load_start = Instant::now();
            let mut model = provider
                .load(&stage.name)
                .map_err(|source| RuntimeError::ModelLoad {
                    stage: stage_name.clone(),
                    source,
                })?;
            let load_duration = load_start.elapsed();
            tracing::info!(
                "stage {} '{}': model loaded in {:.3}s",
                stage.index,
                stage_name,
                load_duration.as_secs_f64(),
            );

            let infer_start = Instant::now();
            for _ in 0..stage.steps {
                // A validated plan never trips this guard or the one after
                // the increment below.
                let embedding = embeddings
                    .get(global_step)
                    .ok_or(RuntimeError::ConsistencyViolation {
                        step: global_step,
                        total,
                    })?;

                let inference_error = |source: BoxError| RuntimeError::Inference {
                    stage: stage_name.clone(),
                    step: global_step,
                    source,
                };

                let next = model.step(&window, embedding).map_err(inference_error)?;
                check_next_window(&window, &next).map_err(|e| inference_error(e.into()))?;
                let output = select(&next, 1, next.dims()[1] - 1)
                    .map_err(|e| inference_error(e.into()))?;

                if let Some((lo, hi)) = min_max(&output) {
                    tracing::debug!("step {global_step:03}: {lo:.2} ~ {hi:.2}");
                }

                sink.save(&output, &provenance, global_step)
                    .map_err(|source| RuntimeError::OutputWrite {
                        step: global_step,
                        source,
                    })?;

                window = next;
                global_step += 1;
                if global_step > total {
                    return Err(RuntimeError::ConsistencyViolation {
                        step: global_step,
                        total,
                    });
                }
            }
            let inference_duration = infer_start.elapsed();

            // ── Release the stage's model before the next load ──
            drop(model);
            tracing::info!(
                "stage {} '{}': {} steps in {:.3}s",
                stage.index,
                stage_name,
                stage.steps,
                inference_duration.as_secs_f64(),
            );
            metrics.record_stage(stage_name, stage.steps, load_duration, inference_duration);
        }

        metrics.finalise(run_start.elapsed());
        tracing::info!("{}", metrics.summary());

        Ok(RunReport {
            steps_saved: global_step,
            metrics,
        })
    }
}

/// Runs a full forecast in one call: plans `step_counts` against the
/// configured stages, then runs from `initial_state`.
pub fn run_forecast<P, O>(
    config: RuntimeConfig,
    provider: &P,
    initial_state: AtmosphericState<Loaded>,
    step_counts: &[usize],
    sink: &mut O,
) -> Result<RunReport, RuntimeError>
where
    P: ModelProvider + ?Sized,
    O: OutputSink + ?Sized,
{
    ForecastDriver::new(config)
        .plan(step_counts)?
        .run(provider, initial_state, sink)
}

/// Checks that a model's result can serve as the next window.
fn check_next_window(window: &Tensor, next: &Tensor) -> Result<(), String> {
    let (w, n) = (window.dims(), next.dims());
    if n.len() != 5 {
        return Err(format!(
            "model returned shape {}, expected [batch, time, variable, lat, lon]",
            next.shape()
        ));
    }
    if n[1] == 0 {
        return Err("model returned an empty time axis".into());
    }
    if n[0] != w[0] || n[2..] != w[2..] {
        return Err(format!(
            "model returned shape {} for window {}; batch, variable, lat and lon must match",
            next.shape(),
            window.shape()
        ));
    }
    Ok(())
}

impl<S: DriverState> std::fmt::Debug for ForecastDriver<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForecastDriver")
            .field("state", &std::any::type_name::<S>())
            .field("model_dir", &self.config.model_dir)
            .field("device", &self.config.device)
            .field("has_plan", &self.plan.is_some())
            .finish()
    }
}
