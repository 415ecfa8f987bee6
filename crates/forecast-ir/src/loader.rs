// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Initial-state loading from SafeTensors files.
//!
//! The file holds the field, its coordinates and its timestamps (see the
//! crate docs for the layout). Loading does **not** validate; callers
//! decide when to move the state to `Validated`.

use crate::safetensors_io::{self, map_file, parse, read_f32, read_metadata};
use crate::state::{AtmosphericState, Loaded, StateCheck};
use crate::{Grid, IrError};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::Path;
use time_encoding::parse_timestamp;

const STATE_TENSOR: &str = "state";
const LAT_TENSOR: &str = "lat";
const LON_TENSOR: &str = "lon";
const TIMES_KEY: &str = "times";
const VARIABLES_KEY: &str = "variables";

/// Stored timestamp layout.
pub(crate) const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Reads and writes [`AtmosphericState`] files.
pub struct StateLoader;

impl StateLoader {
    /// Loads a state from `path`. The file name becomes the state's source
    /// label.
    pub fn load(path: &Path) -> Result<AtmosphericState<Loaded>, IrError> {
        let mmap = map_file(path)?;
        let state = Self::from_bytes(&mmap)?;
        tracing::info!("loaded {} from {}", state.summary(), path.display());

        Ok(match path.file_name() {
            Some(name) => state.with_source(name.to_string_lossy()),
            None => state,
        })
    }

    /// Decodes a state from an in-memory SafeTensors buffer.
    pub fn from_bytes(bytes: &[u8]) -> Result<AtmosphericState<Loaded>, IrError> {
        let metadata = read_metadata(bytes)?;
        let tensors = parse(bytes)?;

        let data = read_f32(&tensors, STATE_TENSOR)?;
        let latitudes = read_f32(&tensors, LAT_TENSOR)?.into_vec();
        let longitudes = read_f32(&tensors, LON_TENSOR)?.into_vec();

        let times = metadata
            .get(TIMES_KEY)
            .ok_or_else(|| IrError::SafeTensors(format!("metadata '{TIMES_KEY}' missing")))?
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(parse_timestamp)
            .collect::<Result<Vec<NaiveDateTime>, _>>()?;

        let num_variables = data.dims().get(1).copied().unwrap_or(0);
        let grid = match metadata.get(VARIABLES_KEY) {
            Some(csv) if !csv.is_empty() => Grid::new(
                latitudes,
                longitudes,
                csv.split(',').map(|s| s.trim().to_string()).collect(),
            ),
            _ => Grid::with_unnamed_variables(latitudes, longitudes, num_variables),
        };

        Ok(AtmosphericState::new(data, grid, times))
    }

    /// Writes `state` to `path` in the layout [`StateLoader::load`] reads.
    pub fn save<S: StateCheck>(state: &AtmosphericState<S>, path: &Path) -> Result<(), IrError> {
        let grid = state.grid();
        let lat = tensor_core::Tensor::from_f32(
            tensor_core::Shape::vector(grid.latitudes().len()),
            grid.latitudes(),
        )?;
        let lon = tensor_core::Tensor::from_f32(
            tensor_core::Shape::vector(grid.longitudes().len()),
            grid.longitudes(),
        )?;

        let times: Vec<String> = state
            .times()
            .iter()
            .map(|t| t.format(TIME_FORMAT).to_string())
            .collect();
        let mut metadata = HashMap::new();
        metadata.insert(TIMES_KEY.to_string(), times.join(","));
        metadata.insert(VARIABLES_KEY.to_string(), grid.variables_csv());

        safetensors_io::write_f32(
            path,
            &[(STATE_TENSOR, state.data()), (LAT_TENSOR, &lat), (LON_TENSOR, &lon)],
            metadata,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::{Shape, Tensor};

    fn sample_state() -> AtmosphericState<Loaded> {
        let grid = Grid::new(
            vec![90.0, 0.0, -90.0],
            vec![0.0, 180.0],
            vec!["z500".into(), "t850".into()],
        );
        let values: Vec<f32> = (0..24).map(|v| v as f32).collect();
        let data = Tensor::from_vec(Shape::new(vec![2, 2, 3, 2]), values).unwrap();
        let times = vec![
            parse_timestamp("2023-12-31T18:00").unwrap(),
            parse_timestamp("2024-01-01T00:00").unwrap(),
        ];
        AtmosphericState::new(data, grid, times)
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("2024-01-01-00-00.safetensors");
        let original = sample_state();
        StateLoader::save(&original, &path).unwrap();

        let loaded = StateLoader::load(&path).unwrap();
        assert_eq!(loaded.data(), original.data());
        assert_eq!(loaded.grid(), original.grid());
        assert_eq!(loaded.times(), original.times());
        assert_eq!(loaded.source(), Some("2024-01-01-00-00.safetensors"));

        let validated = loaded.validate().unwrap();
        assert_eq!(
            validated.init_time(),
            parse_timestamp("2024-01-01T00:00").unwrap()
        );
    }

    #[test]
    fn test_missing_times_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.safetensors");
        let state = sample_state();
        let lat = Tensor::from_f32(Shape::vector(3), &[90.0, 0.0, -90.0]).unwrap();
        let lon = Tensor::from_f32(Shape::vector(2), &[0.0, 180.0]).unwrap();
        safetensors_io::write_f32(
            &path,
            &[("state", state.data()), ("lat", &lat), ("lon", &lon)],
            HashMap::new(),
        )
        .unwrap();

        let err = StateLoader::load(&path).unwrap_err();
        assert!(err.to_string().contains("metadata 'times' missing"));
    }

    #[test]
    fn test_missing_file() {
        let err = StateLoader::load(Path::new("/nonexistent/state.safetensors")).unwrap_err();
        assert!(matches!(err, IrError::Io(_)));
    }
}
