// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Affine reference backend with memory-mapped SafeTensors weights.
//!
//! Each stage's weights live in `<model_dir>/<stage>.safetensors`:
//!
//! | Tensor        | Shape     | Required |
//! |---------------|-----------|----------|
//! | `scale`       | `[C]`     | yes      |
//! | `bias`        | `[C]`     | yes      |
//! | `temb_weight` | `[C, 12]` | no       |
//!
//! A step computes, for the last time slice `x` of the window,
//! `y[c] = scale[c] * x[c] + bias[c] + temb_weight[c] · embedding`,
//! then drops the oldest slice and appends `y`.

use crate::{BoxError, Device, ForecastModel, ModelProvider, RuntimeConfig};
use forecast_ir::{safetensors_io, StageName};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tensor_core::{concat, narrow, select, unsqueeze, Shape, Tensor};
use time_encoding::{TemporalEmbedding, EMBEDDING_DIM};

const SCALE: &str = "scale";
const BIAS: &str = "bias";
const TEMB_WEIGHT: &str = "temb_weight";

// ── Weights ────────────────────────────────────────────────────────

/// Per-channel parameters of one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct AffineWeights {
    scale: Tensor,
    bias: Tensor,
    temb_weight: Option<Tensor>,
}

impl AffineWeights {
    /// Builds weights, checking that shapes agree.
    pub fn new(scale: Tensor, bias: Tensor, temb_weight: Option<Tensor>) -> Result<Self, BoxError> {
        if scale.rank() != 1 {
            return Err(format!("'{SCALE}' must be 1-D, got shape {}", scale.shape()).into());
        }
        let channels = scale.dims()[0];
        if bias.dims() != [channels] {
            return Err(format!(
                "'{BIAS}' has shape {}, expected [{channels}]",
                bias.shape()
            )
            .into());
        }
        if let Some(w) = &temb_weight {
            if w.dims() != [channels, EMBEDDING_DIM] {
                return Err(format!(
                    "'{TEMB_WEIGHT}' has shape {}, expected [{channels}, {EMBEDDING_DIM}]",
                    w.shape()
                )
                .into());
            }
        }
        Ok(Self {
            scale,
            bias,
            temb_weight,
        })
    }

    /// Unit scale, zero bias, no temporal term.
    pub fn identity(channels: usize) -> Self {
        let mut scale = Tensor::zeros(Shape::vector(channels));
        scale.fill(1.0);
        Self {
            scale,
            bias: Tensor::zeros(Shape::vector(channels)),
            temb_weight: None,
        }
    }

    pub fn channels(&self) -> usize {
        self.scale.dims()[0]
    }

    /// Reads weights from a memory-mapped SafeTensors file.
    pub fn load(path: &Path) -> Result<Self, BoxError> {
        let mmap = safetensors_io::map_file(path)
            .map_err(|e| format!("cannot open '{}': {e}", path.display()))?;
        tracing::debug!(
            "mmap'd {} ({:.2} MB)",
            path.display(),
            mmap.len() as f64 / (1024.0 * 1024.0),
        );

        let tensors = safetensors_io::parse(&mmap)?;
        let scale = safetensors_io::read_f32(&tensors, SCALE)?;
        let bias = safetensors_io::read_f32(&tensors, BIAS)?;
        let temb_weight = if safetensors_io::contains(&tensors, TEMB_WEIGHT) {
            Some(safetensors_io::read_f32(&tensors, TEMB_WEIGHT)?)
        } else {
            None
        };
        Self::new(scale, bias, temb_weight)
    }

    /// Writes weights in the layout [`AffineWeights::load`] reads.
    pub fn save(&self, path: &Path) -> Result<(), BoxError> {
        let mut tensors = vec![(SCALE, &self.scale), (BIAS, &self.bias)];
        if let Some(w) = &self.temb_weight {
            tensors.push((TEMB_WEIGHT, w));
        }
        safetensors_io::write_f32(path, &tensors, HashMap::new())?;
        Ok(())
    }
}

// ── Provider ───────────────────────────────────────────────────────

/// Loads [`AffineModel`]s from a model directory.
#[derive(Debug, Clone)]
pub struct AffineModelProvider {
    model_dir: PathBuf,
    device: Device,
    threads: usize,
}

impl AffineModelProvider {
    pub fn new(model_dir: impl Into<PathBuf>, device: Device, threads: usize) -> Self {
        Self {
            model_dir: model_dir.into(),
            device,
            threads: threads.max(1),
        }
    }

    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(
            config.model_dir.clone(),
            config.device,
            config.resolve_threads(),
        )
    }

    /// Path of the weights file for `stage`.
    pub fn weights_path(&self, stage: &StageName) -> PathBuf {
        self.model_dir.join(format!("{stage}.safetensors"))
    }
}

impl ModelProvider for AffineModelProvider {
    fn load(&self, stage: &StageName) -> Result<Box<dyn ForecastModel>, BoxError> {
        if self.device != Device::Cpu {
            return Err(format!(
                "device '{}' is not supported by the affine backend; use 'cpu'",
                self.device
            )
            .into());
        }
        let weights = AffineWeights::load(&self.weights_path(stage))?;
        tracing::info!(
            "affine model '{stage}': {} channels, temporal term {}, {} threads",
            weights.channels(),
            if weights.temb_weight.is_some() { "on" } else { "off" },
            self.threads,
        );
        Ok(Box::new(AffineModel::new(stage.clone(), weights, self.threads)))
    }
}

// ── Model ──────────────────────────────────────────────────────────

/// A loaded stage of the affine backend.
#[derive(Debug)]
pub struct AffineModel {
    stage: StageName,
    weights: AffineWeights,
    threads: usize,
}

impl AffineModel {
    pub fn new(stage: StageName, weights: AffineWeights, threads: usize) -> Self {
        Self {
            stage,
            weights,
            threads: threads.max(1),
        }
    }

    /// Applies the per-channel affine map to `x` of shape `[1, C, H, W]`.
    fn forecast_slice(&self, x: &Tensor, embedding: &TemporalEmbedding) -> Tensor {
        let channels = self.weights.channels();
        let plane = x.shape().num_elements() / channels.max(1);
        let scale = self.weights.scale.as_slice();
        let bias = self.weights.bias.as_slice();
        let emb = embedding.as_slice();

        // Per-channel offset: bias plus the temporal term.
        let offsets: Vec<f32> = (0..channels)
            .map(|c| {
                let temb: f32 = self.weights.temb_weight.as_ref().map_or(0.0, |w| {
                    let row = &w.as_slice()[c * EMBEDDING_DIM..(c + 1) * EMBEDDING_DIM];
                    row.iter().zip(emb).map(|(a, b)| a * b).sum()
                });
                bias[c] + temb
            })
            .collect();

        let mut y = x.clone();
        if plane == 0 {
            return y;
        }
        let per_thread = channels.div_ceil(self.threads).max(1);
        let src = x.as_slice();

        std::thread::scope(|s| {
            for (chunk_idx, out) in y.as_mut_slice().chunks_mut(per_thread * plane).enumerate() {
                let first = chunk_idx * per_thread;
                let input = &src[first * plane..first * plane + out.len()];
                let offsets = &offsets;
                s.spawn(move || {
                    for (i, (o, &v)) in out.iter_mut().zip(input).enumerate() {
                        let c = first + i / plane;
                        *o = scale[c] * v + offsets[c];
                    }
                });
            }
        });
        y
    }
}

impl ForecastModel for AffineModel {
    fn step(&mut self, window: &Tensor, embedding: &TemporalEmbedding) -> Result<Tensor, BoxError> {
        let dims = window.dims();
        if dims.len() != 5 || dims[0] != 1 {
            return Err(format!(
                "expected window [1, time, variable, lat, lon], got {}",
                window.shape()
            )
            .into());
        }
        let (time, channels) = (dims[1], dims[2]);
        if time == 0 {
            return Err("window has an empty time axis".into());
        }
        if channels != self.weights.channels() {
            return Err(format!(
                "window has {channels} variables but stage '{}' has weights for {}",
                self.stage,
                self.weights.channels()
            )
            .into());
        }

        let last = select(window, 1, time - 1)?;
        let y = unsqueeze(self.forecast_slice(&last, embedding), 1)?;
        if time == 1 {
            return Ok(y);
        }
        let kept = narrow(window, 1, 1, time - 1)?;
        Ok(concat(&[&kept, &y], 1)?)
    }
}

impl Drop for AffineModel {
    fn drop(&mut self) {
        tracing::debug!("released affine model '{}'", self.stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time_encoding::{parse_timestamp, TimeEncoder};

    fn embedding() -> TemporalEmbedding {
        TimeEncoder::default()
            .encode(parse_timestamp("2024-01-01T00:00").unwrap(), 1)
            .unwrap()[0]
    }

    /// `[1, 2, C, 1, 2]` window; slice `t` holds value `t + 1` everywhere.
    fn window(channels: usize) -> Tensor {
        let per_slice = channels * 2;
        let data = (0..2)
            .flat_map(|t| std::iter::repeat((t + 1) as f32).take(per_slice))
            .collect();
        Tensor::from_vec(Shape::new(vec![1, 2, channels, 1, 2]), data).unwrap()
    }

    fn weights(channels: usize, temb: bool) -> AffineWeights {
        let scale: Vec<f32> = (0..channels).map(|c| (c + 1) as f32).collect();
        let bias: Vec<f32> = vec![0.5; channels];
        let temb_weight = temb.then(|| {
            let mut w = Tensor::zeros(Shape::new(vec![channels, EMBEDDING_DIM]));
            w.fill(1.0);
            w
        });
        AffineWeights::new(
            Tensor::from_vec(Shape::vector(channels), scale).unwrap(),
            Tensor::from_vec(Shape::vector(channels), bias).unwrap(),
            temb_weight,
        )
        .unwrap()
    }

    #[test]
    fn test_step_rolls_window() {
        let mut model = AffineModel::new("short".into(), weights(3, false), 2);
        let next = model.step(&window(3), &embedding()).unwrap();
        assert_eq!(next.dims(), &[1, 2, 3, 1, 2]);

        // Oldest slice dropped: slice 0 now holds the old slice 1.
        let first = select(&next, 1, 0).unwrap();
        assert!(first.as_slice().iter().all(|&v| v == 2.0));

        // New slice: (c + 1) * 2 + 0.5 per channel.
        let last = select(&next, 1, 1).unwrap();
        assert_eq!(last.as_slice(), &[2.5, 2.5, 4.5, 4.5, 6.5, 6.5]);
    }

    #[test]
    fn test_step_temporal_term() {
        let e = embedding();
        let sum: f32 = e.as_slice().iter().sum();
        let mut model = AffineModel::new("short".into(), weights(1, true), 1);
        let next = model.step(&window(1), &e).unwrap();
        let last = select(&next, 1, 1).unwrap();
        for &v in last.as_slice() {
            assert!((v - (2.0 + 0.5 + sum)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_thread_count_does_not_change_result() {
        let w = weights(5, true);
        let e = embedding();
        let a = AffineModel::new("short".into(), w.clone(), 1)
            .step(&window(5), &e)
            .unwrap();
        let b = AffineModel::new("short".into(), w, 4)
            .step(&window(5), &e)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_single_slice_window() {
        let mut model = AffineModel::new("short".into(), weights(2, false), 1);
        let w = Tensor::zeros(Shape::new(vec![1, 1, 2, 1, 2]));
        let next = model.step(&w, &embedding()).unwrap();
        assert_eq!(next.dims(), &[1, 1, 2, 1, 2]);
        assert!(next.as_slice().iter().all(|&v| v == 0.5));
    }

    #[test]
    fn test_channel_mismatch() {
        let mut model = AffineModel::new("medium".into(), weights(2, false), 1);
        let err = model.step(&window(3), &embedding()).unwrap_err();
        assert!(err.to_string().contains("3 variables"));
    }

    #[test]
    fn test_weights_shape_checks() {
        let scale = Tensor::zeros(Shape::vector(2));
        let bad_bias = Tensor::zeros(Shape::vector(3));
        assert!(AffineWeights::new(scale.clone(), bad_bias, None).is_err());

        let bias = Tensor::zeros(Shape::vector(2));
        let bad_temb = Tensor::zeros(Shape::new(vec![2, 4]));
        assert!(AffineWeights::new(scale, bias, Some(bad_temb)).is_err());
    }

    #[test]
    fn test_provider_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        weights(3, true)
            .save(&dir.path().join("short.safetensors"))
            .unwrap();

        let provider = AffineModelProvider::new(dir.path(), Device::Cpu, 2);
        let mut model = provider.load(&"short".into()).unwrap();
        let next = model.step(&window(3), &embedding()).unwrap();
        assert_eq!(next.dims(), &[1, 2, 3, 1, 2]);
    }

    #[test]
    fn test_provider_missing_weights() {
        let dir = tempfile::tempdir().unwrap();
        let provider = AffineModelProvider::new(dir.path(), Device::Cpu, 1);
        let err = provider.load(&"long".into()).err().unwrap();
        assert!(err.to_string().contains("long.safetensors"));
    }

    #[test]
    fn test_provider_rejects_cuda() {
        let dir = tempfile::tempdir().unwrap();
        AffineWeights::identity(1)
            .save(&dir.path().join("short.safetensors"))
            .unwrap();
        let provider = AffineModelProvider::new(dir.path(), Device::Cuda, 1);
        let err = provider.load(&"short".into()).err().unwrap();
        assert!(err.to_string().contains("cuda"));
    }

    #[test]
    fn test_from_config() {
        let config = RuntimeConfig {
            model_dir: PathBuf::from("/models/fuxi"),
            intra_op_threads: Some(3),
            ..Default::default()
        };
        let provider = AffineModelProvider::from_config(&config);
        assert_eq!(
            provider.weights_path(&"medium".into()),
            PathBuf::from("/models/fuxi/medium.safetensors")
        );
    }
}
