// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! model_dir = "./models/fuxi"
//! device = "cpu"
//! intra_op_threads = 5
//! stages = ["short", "medium", "long"]
//! freq_hours = 6
//! num_steps = [20, 20, 20]
//! ```

use crate::RuntimeError;
use forecast_ir::StageName;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use time_encoding::DEFAULT_FREQ_HOURS;

/// Execution device requested from the model backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda => f.write_str("cuda"),
        }
    }
}

impl std::str::FromStr for Device {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            "cuda" | "gpu" => Ok(Device::Cuda),
            other => Err(RuntimeError::ConfigError(format!(
                "unknown device '{other}'; expected 'cpu' or 'cuda'"
            ))),
        }
    }
}

/// Configuration for a forecast run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RuntimeConfig {
    /// Directory holding one model per stage.
    pub model_dir: PathBuf,
    #[serde(default)]
    pub device: Device,
    /// Threads a model may use inside one step (defaults to number of
    /// online CPU cores).
    pub intra_op_threads: Option<usize>,
    /// Stage names in run order; step counts are matched by position.
    #[serde(default = "default_stages")]
    pub stages: Vec<StageName>,
    /// Hours between consecutive forecast steps.
    #[serde(default = "default_freq_hours")]
    pub freq_hours: u32,
    /// Steps per stage. Fewer entries than stages runs only the leading
    /// stages.
    #[serde(default = "default_num_steps")]
    pub num_steps: Vec<usize>,
}

fn default_stages() -> Vec<StageName> {
    StageName::canonical()
}

fn default_freq_hours() -> u32 {
    DEFAULT_FREQ_HOURS
}

fn default_num_steps() -> Vec<usize> {
    vec![20]
}

impl RuntimeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        toml::from_str(toml_str)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML serialise error: {e}")))
    }

    /// Resolves the number of intra-op threads.
    pub fn resolve_threads(&self) -> usize {
        self.intra_op_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        })
    }

    pub fn stage_names(&self) -> &[StageName] {
        &self.stages
    }

    /// Checks values that TOML parsing alone cannot.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.model_dir.as_os_str().is_empty() {
            return Err(RuntimeError::ConfigError("model_dir is empty".into()));
        }
        if self.stages.is_empty() {
            return Err(RuntimeError::ConfigError("no stages configured".into()));
        }
        let mut seen = HashSet::new();
        for name in &self.stages {
            if name.as_str().is_empty() {
                return Err(RuntimeError::ConfigError("empty stage name".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(RuntimeError::ConfigError(format!(
                    "stage '{name}' listed more than once"
                )));
            }
        }
        if self.freq_hours == 0 {
            return Err(RuntimeError::ConfigError(
                "freq_hours must be positive".into(),
            ));
        }
        if self.intra_op_threads == Some(0) {
            return Err(RuntimeError::ConfigError(
                "intra_op_threads must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./models"),
            device: Device::Cpu,
            intra_op_threads: None,
            stages: default_stages(),
            freq_hours: DEFAULT_FREQ_HOURS,
            num_steps: default_num_steps(),
        }
    }
}
