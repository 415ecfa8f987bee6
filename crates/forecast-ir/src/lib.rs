// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # forecast-ir
//!
//! The data model shared by the forecast driver and its collaborators.
//!
//! - [`Grid`]: latitude, longitude and variable coordinates of a field.
//! - [`AtmosphericState`]: a `[time, variable, lat, lon]` field with its
//!   grid and timestamps, using a **type-state pattern**
//!   (`Loaded` → `Validated`) so that only north-to-south, shape-consistent
//!   states reach the driver.
//! - [`Provenance`]: what an output sink needs to place a step's output.
//! - [`StageName`], [`Stage`], [`StagePlan`]: the ordered run plan.
//! - [`StateLoader`]: reads and writes initial states as SafeTensors files.
//!
//! # State File Format
//! A state is stored as a single `.safetensors` file:
//! - tensors `state` `[T, C, H, W]`, `lat` `[H]`, `lon` `[W]`, all `F32`;
//! - metadata `times` (comma-separated, one per `T`) and optionally
//!   `variables` (comma-separated, one per `C`).
//!
//! # Example
//! ```no_run
//! use forecast_ir::{StagePlan, StateLoader};
//! use std::path::Path;
//!
//! let state = StateLoader::load(Path::new("./input/2024-01-01-00-00.safetensors"))
//!     .unwrap()
//!     .validate()
//!     .unwrap();
//! println!("{}", state.summary());
//!
//! let plan = StagePlan::canonical(&[20, 20, 20]).unwrap();
//! println!("{}", plan.summary());
//! ```

mod error;
mod grid;
mod loader;
mod plan;
pub mod safetensors_io;
mod stage;
pub mod state;

pub use error::IrError;
pub use grid::Grid;
pub use loader::StateLoader;
pub use plan::StagePlan;
pub use stage::{Stage, StageName, CANONICAL_STAGES};
pub use state::{AtmosphericState, Provenance};
