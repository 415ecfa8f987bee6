// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Output sinks.
//!
//! - [`MemorySink`] keeps every step's output in memory.
//! - [`SafeTensorsSink`] writes one `.safetensors` file per step, named by
//!   lead time in hours: `006.safetensors`, `012.safetensors`, ...

use crate::{BoxError, OutputSink, RuntimeError};
use chrono::NaiveDateTime;
use forecast_ir::{safetensors_io, Provenance};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tensor_core::{Shape, Tensor};

/// Timestamp layout used in output metadata.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ── MemorySink ─────────────────────────────────────────────────────

/// One output kept by a [`MemorySink`].
#[derive(Debug, Clone, PartialEq)]
pub struct SavedOutput {
    pub step: usize,
    pub valid_time: Option<NaiveDateTime>,
    pub output: Tensor,
}

/// Collects outputs in memory, in save order.
#[derive(Debug, Default)]
pub struct MemorySink {
    outputs: Vec<SavedOutput>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outputs(&self) -> &[SavedOutput] {
        &self.outputs
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Step indices in the order they were saved.
    pub fn steps(&self) -> Vec<usize> {
        self.outputs.iter().map(|o| o.step).collect()
    }

    pub fn into_outputs(self) -> Vec<SavedOutput> {
        self.outputs
    }
}

impl OutputSink for MemorySink {
    fn save(
        &mut self,
        output: &Tensor,
        provenance: &Provenance,
        global_step: usize,
    ) -> Result<(), BoxError> {
        self.outputs.push(SavedOutput {
            step: global_step,
            valid_time: provenance.valid_time(global_step),
            output: output.clone(),
        });
        Ok(())
    }
}

// ── SafeTensorsSink ────────────────────────────────────────────────

/// Writes each step to `<dir>/<lead_hours:03>.safetensors`.
///
/// Each file holds tensors `output` `[1, variable, lat, lon]`, `lat` and
/// `lon`, plus metadata `init_time`, `valid_time`, `step`, `lead_hours`,
/// `variables` and `source`.
#[derive(Debug)]
pub struct SafeTensorsSink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl SafeTensorsSink {
    /// Creates the sink, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, RuntimeError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            RuntimeError::ConfigError(format!(
                "cannot create output directory '{}': {e}",
                dir.display()
            ))
        })?;
        tracing::info!("writing forecast outputs to {}", dir.display());
        Ok(Self {
            dir,
            written: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files written so far, in step order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// File name for the output at `lead_hours`.
    pub fn file_name(lead_hours: u64) -> String {
        format!("{lead_hours:03}.safetensors")
    }
}

impl OutputSink for SafeTensorsSink {
    fn save(
        &mut self,
        output: &Tensor,
        provenance: &Provenance,
        global_step: usize,
    ) -> Result<(), BoxError> {
        let lead = provenance.lead_hours(global_step);
        let valid_time = provenance.valid_time(global_step).ok_or_else(|| {
            format!("valid time of step {global_step} is outside the representable range")
        })?;

        let grid = provenance.grid();
        let lat = Tensor::from_f32(Shape::vector(grid.latitudes().len()), grid.latitudes())?;
        let lon = Tensor::from_f32(Shape::vector(grid.longitudes().len()), grid.longitudes())?;

        let mut metadata = HashMap::new();
        metadata.insert(
            "init_time".to_string(),
            provenance.init_time().format(TIME_FORMAT).to_string(),
        );
        metadata.insert(
            "valid_time".to_string(),
            valid_time.format(TIME_FORMAT).to_string(),
        );
        metadata.insert("step".to_string(), global_step.to_string());
        metadata.insert("lead_hours".to_string(), lead.to_string());
        metadata.insert("variables".to_string(), grid.variables_csv());
        if let Some(source) = provenance.source() {
            metadata.insert("source".to_string(), source.to_string());
        }

        let path = self.dir.join(Self::file_name(lead));
        safetensors_io::write_f32(
            &path,
            &[("output", output), ("lat", &lat), ("lon", &lon)],
            metadata,
        )?;
        tracing::debug!("saved step {global_step} to {}", path.display());
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_ir::Grid;
    use time_encoding::parse_timestamp;

    fn provenance() -> Provenance {
        Provenance::new(
            parse_timestamp("2024-01-01T00:00").unwrap(),
            6,
            Grid::regular(90.0, 2),
            Some("2024-01-01-00-00.safetensors".into()),
        )
    }

    fn output(value: f32) -> Tensor {
        let mut t = Tensor::zeros(Shape::new(vec![1, 2, 3, 4]));
        t.fill(value);
        t
    }

    #[test]
    fn test_memory_sink_keeps_order_and_valid_time() {
        let p = provenance();
        let mut sink = MemorySink::new();
        sink.save(&output(1.0), &p, 0).unwrap();
        sink.save(&output(2.0), &p, 1).unwrap();

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.steps(), vec![0, 1]);
        assert_eq!(
            sink.outputs()[1].valid_time,
            Some(parse_timestamp("2024-01-01T12:00").unwrap())
        );
        assert_eq!(sink.outputs()[1].output.as_slice()[0], 2.0);
    }

    #[test]
    fn test_file_name() {
        assert_eq!(SafeTensorsSink::file_name(6), "006.safetensors");
        assert_eq!(SafeTensorsSink::file_name(360), "360.safetensors");
        assert_eq!(SafeTensorsSink::file_name(1080), "1080.safetensors");
    }

    #[test]
    fn test_safetensors_sink_writes_named_files() {
        let dir = tempfile::tempdir().unwrap();
        let out_dir = dir.path().join("output");
        let p = provenance();
        let mut sink = SafeTensorsSink::new(&out_dir).unwrap();
        sink.save(&output(0.5), &p, 0).unwrap();
        sink.save(&output(1.5), &p, 3).unwrap();

        assert_eq!(sink.written().len(), 2);
        assert!(out_dir.join("006.safetensors").exists());
        assert!(out_dir.join("024.safetensors").exists());

        let bytes = std::fs::read(out_dir.join("024.safetensors")).unwrap();
        let meta = safetensors_io::read_metadata(&bytes).unwrap();
        assert_eq!(meta["init_time"], "2024-01-01T00:00:00");
        assert_eq!(meta["valid_time"], "2024-01-02T00:00:00");
        assert_eq!(meta["step"], "3");
        assert_eq!(meta["lead_hours"], "24");
        assert_eq!(meta["variables"], "var0,var1");
        assert_eq!(meta["source"], "2024-01-01-00-00.safetensors");

        let parsed = safetensors_io::parse(&bytes).unwrap();
        assert_eq!(safetensors_io::read_f32(&parsed, "output").unwrap(), output(1.5));
        let lat = safetensors_io::read_f32(&parsed, "lat").unwrap();
        assert_eq!(lat.as_slice(), &[90.0, 0.0, -90.0]);
    }

    #[test]
    fn test_safetensors_sink_unwritable_dir() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let result = SafeTensorsSink::new(file.path().join("sub"));
        assert!(matches!(result, Err(RuntimeError::ConfigError(_))));
    }
}
